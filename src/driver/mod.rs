use crate::action::Action;
use crate::error::DriverError;
use crate::ui::UiNode;

pub mod sim;

pub use sim::{AppModel, SharedDevice, SimElement, SimPage, SimulatedDevice, LAUNCHER_APP};

/// Keys the explorer may press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Back,
    Home,
}

/// The single interface between the explorer and a device.
///
/// # Contract
/// - Calls are synchronous and strictly serialized by the caller.
/// - Implementations may be unreliable: stale or empty trees, an empty
///   ability or page, transient command failures. The explorer treats all
///   of these as recoverable.
/// - `current_foreground` returns `(app, ability)`; `current_page` returns
///   `(ability, page_path)`.
pub trait Driver: Send {
    fn launch(&mut self, app: &str, ability: &str) -> Result<(), DriverError>;
    fn stop(&mut self, app: &str) -> Result<(), DriverError>;
    fn force_stop(&mut self) -> Result<(), DriverError>;
    fn click(&mut self, x: i32, y: i32) -> Result<(), DriverError>;
    fn back(&mut self) -> Result<(), DriverError>;
    fn input_text(&mut self, text: &str) -> Result<(), DriverError>;
    fn press_key(&mut self, key: KeyCode) -> Result<(), DriverError>;
    fn current_foreground(&mut self) -> Result<(String, String), DriverError>;
    fn current_page(&mut self) -> Result<(String, String), DriverError>;
    fn dump_ui_tree(&mut self) -> Result<UiNode, DriverError>;
}

/// What executing an action did on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Clicked { element_type: String },
    WentBack,
    Restarted,
}

/// Executes one action against the device.
///
/// A Click re-resolves its structural path on a fresh dump, so a control
/// that moved is still hit. A path that no longer resolves is reported as
/// `ElementNotFound` without touching the device.
pub fn execute_action(driver: &mut dyn Driver, action: &Action) -> Result<Execution, DriverError> {
    match action {
        Action::Click(click) => {
            let tree = driver.dump_ui_tree()?;
            let node = tree.locate(&click.location)
                .ok_or_else(|| DriverError::ElementNotFound(click.location.clone()))?;
            let (x, y) = node.bounds()
                .map(|b| b.center())
                .unwrap_or((click.x, click.y));
            let element_type = node.node_type().to_string();
            driver.click(x, y)?;
            Ok(Execution::Clicked { element_type })
        }
        Action::Back(_) => {
            driver.back()?;
            Ok(Execution::WentBack)
        }
        Action::Restart { app, ability } => {
            driver.stop(app)?;
            driver.launch(app, ability)?;
            Ok(Execution::Restarted)
        }
    }
}
