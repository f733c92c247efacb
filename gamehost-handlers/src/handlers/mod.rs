pub mod asg_capacity;
pub mod service_capacity;
pub mod timer_tick;
pub mod update_dns;
