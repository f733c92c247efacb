//! Name constants for gamehost handlers
//!
//! Naming convention: {crate-name}::{type}::{name}

/// Handler names
pub mod handlers {
    /// Set the autoscaling group's desired capacity from a timer tick
    ///
    /// **Event:** [`crate::types::TimerTick`]
    /// **Output:** [`crate::types::CapacityOutput`]
    /// **Idempotent:** Yes (level-triggered 0/1 write)
    pub const ASG_SET_DESIRED_CAPACITY: &str = "gamehost-handlers::handler::asg-set-desired-capacity";

    /// Set the service's desired task count from a timer tick
    ///
    /// **Event:** [`crate::types::TimerTick`]
    /// **Output:** [`crate::types::CapacityOutput`]
    /// **Idempotent:** Yes
    pub const ECS_DESIRED_TASK_COUNT: &str = "gamehost-handlers::handler::ecs-desired-task-count";

    /// Point the game's A record at a newly running task
    ///
    /// **Event:** [`crate::types::TaskStateChangeEvent`]
    /// **Output:** [`crate::types::DnsUpdateOutcome`]
    /// **Idempotent:** Yes (single UPSERT)
    /// **Operations:**
    /// - Resolves the task's network interfaces
    /// - Looks up the hosted zone domain unless one is configured
    /// - Upserts `hostname.domain -> public IP`
    pub const ECS_UPDATE_DNS: &str = "gamehost-handlers::handler::ecs-update-dns";

    /// Fan one timer tick out to both the service and the autoscaling group
    ///
    /// **Event:** [`crate::types::TimerTick`]
    /// **Output:** `Vec<`[`crate::types::CapacityOutput`]`>`
    pub const TIMER_TICK: &str = "gamehost-handlers::handler::timer-tick";

    pub const ALL: [&str; 4] = [
        ASG_SET_DESIRED_CAPACITY,
        ECS_DESIRED_TASK_COUNT,
        ECS_UPDATE_DNS,
        TIMER_TICK,
    ];
}
