mod components;
pub mod mainwin;
mod paramsform;
mod scriptlist;
mod util;
mod workers;

/// Installs the GUI's CSS stylesheet.
///
/// Note: Must be called _after_ [relm4::RelmApp::new].
pub fn install_stylesheet() {
    relm4::set_global_css(include_str!("styles.css"));
}
