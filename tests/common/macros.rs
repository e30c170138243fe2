/// Asserts that an agent with the given id is present in the simulation.
#[macro_export]
macro_rules! assert_agent_alive {
    ($sim:expr, $id:expr) => {
        let exists = $sim.population().iter().any(|a| a.id == $id);
        assert!(exists, "Agent {} should be alive but was not found", $id);
    };
}

/// Asserts that an agent with the given id is NOT present (killed or died).
#[macro_export]
macro_rules! assert_agent_dead {
    ($sim:expr, $id:expr) => {
        let exists = $sim.population().iter().any(|a| a.id == $id);
        assert!(!exists, "Agent {} should be dead but was found alive", $id);
    };
}

/// Asserts that every agent respects its group's speed limit.
#[macro_export]
macro_rules! assert_speed_bounded {
    ($sim:expr) => {
        let params = $sim.parameters();
        for a in $sim.population() {
            let max = params.group(a.group).max_speed;
            assert!(
                a.speed() <= max * (1.0 + 1e-9),
                "Agent {} moves at {} > {}",
                a.id,
                a.speed(),
                max
            );
        }
    };
}
