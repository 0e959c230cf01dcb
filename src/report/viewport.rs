//! Report window sizing

/// Target height of the report window.
///
/// `existing` is the height of an already open report window. Resizing an
/// open window may take one row past half of the combined space.
pub fn plan_viewport(
    requested_lines: usize,
    max_configured: usize,
    host_height: usize,
    existing: Option<usize>,
) -> usize {
    let viewport_bound = match existing {
        None => host_height / 2,
        Some(current) => (host_height + current) / 2 + 1,
    };

    requested_lines.min(max_configured).min(viewport_bound)
}

/// Whether the report should be removed because nothing else is left open
pub fn should_close_report(host_has_other_windows: bool) -> bool {
    !host_has_other_windows
}
