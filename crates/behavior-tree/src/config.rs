/// Engine limits shared by every execution context of a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Upper bound on child executions a `RepeatUntilFail` node performs in a
    /// single tick. When reached, the node returns `Running` and resumes on the
    /// next tick instead of spinning forever on a child that never fails.
    pub max_loop_iterations: u32,
}

impl TreeConfig {
    pub const DEFAULT_MAX_LOOP_ITERATIONS: u32 = 10_000;

    pub fn new() -> Self {
        Self {
            max_loop_iterations: Self::DEFAULT_MAX_LOOP_ITERATIONS,
        }
    }

    /// A budget of zero is raised to one so the child always runs at least once.
    pub fn with_max_loop_iterations(max_loop_iterations: u32) -> Self {
        Self {
            max_loop_iterations: max_loop_iterations.max(1),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
