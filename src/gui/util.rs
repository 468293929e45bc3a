/// Sends an output message from a component, logging a warning if the
/// receiver has gone away.
pub fn send_output_or_log<C: relm4::Component>(
    output: C::Output,
    description: &str,
    sender: &relm4::ComponentSender<C>,
) {
    if sender.output(output).is_err() {
        log::warn!("Failed to send {} message.", description);
    }
}

/// Returns a static path string to an XDG configuration file with the
/// given name, as required by [relm4_components::open_button::OpenButtonSettings].
/// The returned string is leaked; callers must resolve each name once and
/// reuse the result.
pub fn xdg_cfg_static_str(
    xdg_dirs: &xdg::BaseDirectories,
    name: &str,
) -> Option<&'static str> {
    match xdg_dirs.place_config_file(name) {
        Ok(path) => match path.to_str() {
            Some(path_str) => Some(Box::leak(path_str.to_owned().into_boxed_str())),
            None => {
                log::warn!("Configuration file path for {:?} is not valid UTF-8.", name);
                None
            }
        },
        Err(err) => {
            log::warn!("Failed to place configuration file {:?}: {}", name, err);
            None
        }
    }
}
