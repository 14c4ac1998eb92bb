/// Pin the current thread to `core` if one was configured. Does nothing if
/// None.
pub fn pin_if_configured(core: Option<usize>, role: &str) {
    let Some(id) = core else {
        return;
    };

    if core_affinity::set_for_current(core_affinity::CoreId { id }) {
        eprintln!("{} pinned to core {}", role, id);
    } else {
        eprintln!("{}: failed to pin to core {}", role, id);
    }
}
