//! LockDecision: the priority chain that turns violations into a sticky
//! lock or a frame-scoped drop.

/// Inputs the lock decision needs beyond the raw violation flags.
pub struct LockInputs {
    pub rst_lock: bool,
    pub violation_heartbeat: bool,
    pub any_violation: bool,
    pub egress_mode: bool,
    pub rx_last: bool,
    pub byte_ptr: u32,
}

/// The two sticky decision bits `LockDecision` maintains, plus whether
/// a reset fired this cycle (the resync controller and the guard both
/// need to know).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockOutcome {
    pub locked: bool,
    pub drop_current: bool,
    pub reset_fired: bool,
}

/// Apply one cycle of the priority chain described in the lock
/// decision component: `rst_lock` beats `violation_heartbeat` beats
/// `any_violation`, plus an unconditional extra clause for sub-13-byte
/// runt frames in strict (`egress_mode=0`) mode.
///
/// `prev_drop_current` must already reflect the end-of-previous-frame
/// clear (§3: "cleared at end of each frame", §8 P7: "by the cycle
/// following any `rx_last`") — this function does not itself clear
/// `drop_current` on `rx_last`, since `drop_current` must still read as
/// true during the `rx_last` cycle for [`crate::gate`]'s
/// `force_terminate` to fire. The caller applies the frame-end clear
/// when advancing to the next cycle.
pub fn decide(prev_locked: bool, prev_drop_current: bool, inputs: &LockInputs) -> LockOutcome {
    if inputs.rst_lock {
        return LockOutcome {
            locked: false,
            drop_current: false,
            reset_fired: true,
        };
    }

    let mut locked = prev_locked;
    let mut drop_current = prev_drop_current;

    if inputs.violation_heartbeat {
        locked = true;
    } else if inputs.any_violation {
        if !inputs.egress_mode {
            locked = true;
        } else if !inputs.rx_last {
            drop_current = true;
        }
        // else: rx_last already ending the frame, no persistent action.
    }

    // Runt frames additionally force a lock in strict mode, even though
    // the branch above takes no persistent action on an rx_last cycle.
    if inputs.rx_last && inputs.byte_ptr < 13 && !inputs.egress_mode {
        locked = true;
    }

    LockOutcome {
        locked,
        drop_current,
        reset_fired: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rst_lock_clears_everything() {
        let out = decide(
            true,
            true,
            &LockInputs {
                rst_lock: true,
                violation_heartbeat: false,
                any_violation: false,
                egress_mode: false,
                rx_last: false,
                byte_ptr: 0,
            },
        );
        assert!(!out.locked);
        assert!(!out.drop_current);
        assert!(out.reset_fired);
    }

    #[test]
    fn heartbeat_locks_regardless_of_mode() {
        let out = decide(
            false,
            false,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat: true,
                any_violation: false,
                egress_mode: true,
                rx_last: false,
                byte_ptr: 0,
            },
        );
        assert!(out.locked);
    }

    #[test]
    fn strict_mode_locks_on_violation() {
        let out = decide(
            false,
            false,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat: false,
                any_violation: true,
                egress_mode: false,
                rx_last: false,
                byte_ptr: 30,
            },
        );
        assert!(out.locked);
    }

    #[test]
    fn permissive_mode_drops_frame_instead_of_locking() {
        let out = decide(
            false,
            false,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat: false,
                any_violation: true,
                egress_mode: true,
                rx_last: false,
                byte_ptr: 30,
            },
        );
        assert!(!out.locked);
        assert!(out.drop_current);
    }

    #[test]
    fn runt_forces_lock_in_strict_mode() {
        let out = decide(
            false,
            false,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat: false,
                any_violation: true,
                egress_mode: false,
                rx_last: true,
                byte_ptr: 5,
            },
        );
        assert!(out.locked);
    }

    #[test]
    fn runt_does_not_force_lock_in_permissive_mode() {
        let out = decide(
            false,
            false,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat: false,
                any_violation: true,
                egress_mode: true,
                rx_last: true,
                byte_ptr: 5,
            },
        );
        assert!(!out.locked);
    }

    #[test]
    fn lock_is_sticky() {
        let out = decide(
            true,
            false,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat: false,
                any_violation: false,
                egress_mode: true,
                rx_last: false,
                byte_ptr: 30,
            },
        );
        assert!(out.locked);
    }
}
