//! An in-process device that plays a small app model.
//!
//! Used by the demo and the end-to-end tests. Each page renders as a column
//! of clickable elements; clicking an element may navigate to another page
//! or leave the app. Back pops the page stack.

use crate::driver::{Driver, KeyCode};
use crate::error::DriverError;
use crate::ui::{Bounds, UiNode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const LAUNCHER_APP: &str = "com.ohos.launcher";

const ROW_HEIGHT: i32 = 100;
const SCREEN_WIDTH: i32 = 1080;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimElement {
    pub element_type: String,
    /// Page opened when clicked.
    #[serde(default)]
    pub target:       Option<String>,
    /// Clicking hands the foreground to another app.
    #[serde(default)]
    pub leaves_app:   bool,
}

impl SimElement {
    pub fn button(target: impl Into<String>) -> Self {
        Self { element_type: "Button".to_string(), target: Some(target.into()), leaves_app: false }
    }

    pub fn inert(element_type: impl Into<String>) -> Self {
        Self { element_type: element_type.into(), target: None, leaves_app: false }
    }

    pub fn external_link() -> Self {
        Self { element_type: "Button".to_string(), target: None, leaves_app: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimPage {
    pub ability:  String,
    pub elements: Vec<SimElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppModel {
    pub app:           String,
    pub entry_ability: String,
    pub entry_page:    String,
    pub pages:         HashMap<String, SimPage>,
    /// Whether Back on the entry page leaves the app.
    #[serde(default)]
    pub back_exits:    bool,
}

impl AppModel {
    pub fn new(app: impl Into<String>, entry_ability: impl Into<String>, entry_page: impl Into<String>) -> Self {
        Self {
            app:           app.into(),
            entry_ability: entry_ability.into(),
            entry_page:    entry_page.into(),
            pages:         HashMap::new(),
            back_exits:    false,
        }
    }

    pub fn page(mut self, path: impl Into<String>, elements: Vec<SimElement>) -> Self {
        let page = SimPage { ability: self.entry_ability.clone(), elements };
        self.pages.insert(path.into(), page);
        self
    }
}

#[derive(Debug)]
pub struct SimulatedDevice {
    model:      AppModel,
    stack:      Vec<String>,
    foreground: Option<String>,
    typed:      Vec<String>,
    clicks:     usize,
    launches:   usize,
}

impl SimulatedDevice {
    pub fn new(model: AppModel) -> Self {
        Self {
            model,
            stack:      Vec::new(),
            foreground: None,
            typed:      Vec::new(),
            clicks:     0,
            launches:   0,
        }
    }

    pub fn model_mut(&mut self) -> &mut AppModel {
        &mut self.model
    }

    pub fn current_path(&self) -> Option<&str> {
        if self.in_app() { self.stack.last().map(|s| s.as_str()) } else { None }
    }

    pub fn typed_text(&self) -> &[String] {
        &self.typed
    }

    pub fn click_count(&self) -> usize {
        self.clicks
    }

    pub fn launch_count(&self) -> usize {
        self.launches
    }

    fn in_app(&self) -> bool {
        self.foreground.as_deref() == Some(self.model.app.as_str())
    }

    fn current_sim_page(&self) -> Option<&SimPage> {
        self.current_path().and_then(|p| self.model.pages.get(p))
    }

    fn element_bounds(index: usize) -> Bounds {
        let top = index as i32 * ROW_HEIGHT;
        Bounds { left: 0, top, right: SCREEN_WIDTH, bottom: top + ROW_HEIGHT - 10 }
    }

    fn render(page: &SimPage) -> UiNode {
        let mut column = UiNode::new("Column").clickable(false);
        for (i, element) in page.elements.iter().enumerate() {
            column = column.with_child(
                UiNode::new(element.element_type.clone())
                    .clickable(true)
                    .with_bounds(Self::element_bounds(i)),
            );
        }
        UiNode::new("root").clickable(false).with_child(column)
    }
}

impl Driver for SimulatedDevice {
    fn launch(&mut self, app: &str, _ability: &str) -> Result<(), DriverError> {
        if app != self.model.app {
            return Err(DriverError::Command(format!("app '{}' is not installed", app)));
        }
        self.foreground = Some(app.to_string());
        self.stack = vec![self.model.entry_page.clone()];
        self.launches += 1;
        Ok(())
    }

    fn stop(&mut self, app: &str) -> Result<(), DriverError> {
        if self.foreground.as_deref() == Some(app) {
            self.foreground = Some(LAUNCHER_APP.to_string());
        }
        self.stack.clear();
        Ok(())
    }

    fn force_stop(&mut self) -> Result<(), DriverError> {
        let app = self.model.app.clone();
        self.stop(&app)
    }

    fn click(&mut self, x: i32, y: i32) -> Result<(), DriverError> {
        self.clicks += 1;
        let hit = self.current_sim_page().and_then(|page| {
            page.elements.iter().enumerate()
                .find(|(i, _)| Self::element_bounds(*i).contains(x, y))
                .map(|(_, e)| e.clone())
        });
        match hit {
            Some(element) if element.leaves_app => {
                self.foreground = Some(LAUNCHER_APP.to_string());
            }
            Some(SimElement { target: Some(target), .. }) => {
                self.stack.push(target);
            }
            _ => {}
        }
        Ok(())
    }

    fn back(&mut self) -> Result<(), DriverError> {
        if !self.in_app() {
            return Ok(());
        }
        if self.stack.len() > 1 {
            self.stack.pop();
        } else if self.model.back_exits {
            self.foreground = Some(LAUNCHER_APP.to_string());
        }
        Ok(())
    }

    fn input_text(&mut self, text: &str) -> Result<(), DriverError> {
        self.typed.push(text.to_string());
        Ok(())
    }

    fn press_key(&mut self, key: KeyCode) -> Result<(), DriverError> {
        match key {
            KeyCode::Back  => self.back(),
            KeyCode::Home  => {
                self.foreground = Some(LAUNCHER_APP.to_string());
                Ok(())
            }
            KeyCode::Enter => Ok(()),
        }
    }

    fn current_foreground(&mut self) -> Result<(String, String), DriverError> {
        match (&self.foreground, self.current_sim_page()) {
            (Some(app), Some(page)) if self.in_app() => Ok((app.clone(), page.ability.clone())),
            (Some(app), _) => Ok((app.clone(), String::new())),
            (None, _)      => Err(DriverError::Unavailable),
        }
    }

    fn current_page(&mut self) -> Result<(String, String), DriverError> {
        match (self.current_path(), self.current_sim_page()) {
            (Some(path), Some(page)) => Ok((page.ability.clone(), path.to_string())),
            _ => Ok((String::new(), String::new())),
        }
    }

    fn dump_ui_tree(&mut self) -> Result<UiNode, DriverError> {
        Ok(self.current_sim_page()
            .map(Self::render)
            .unwrap_or_else(|| UiNode::new("root")))
    }
}

/// A clonable handle to a simulated device, so tests can inspect or edit
/// the device while an explorer owns it.
#[derive(Debug, Clone)]
pub struct SharedDevice(Arc<Mutex<SimulatedDevice>>);

impl SharedDevice {
    pub fn new(device: SimulatedDevice) -> Self {
        Self(Arc::new(Mutex::new(device)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut SimulatedDevice) -> R) -> R {
        f(&mut self.0.lock())
    }
}

impl Driver for SharedDevice {
    fn launch(&mut self, app: &str, ability: &str) -> Result<(), DriverError> { self.0.lock().launch(app, ability) }
    fn stop(&mut self, app: &str) -> Result<(), DriverError> { self.0.lock().stop(app) }
    fn force_stop(&mut self) -> Result<(), DriverError> { self.0.lock().force_stop() }
    fn click(&mut self, x: i32, y: i32) -> Result<(), DriverError> { self.0.lock().click(x, y) }
    fn back(&mut self) -> Result<(), DriverError> { self.0.lock().back() }
    fn input_text(&mut self, text: &str) -> Result<(), DriverError> { self.0.lock().input_text(text) }
    fn press_key(&mut self, key: KeyCode) -> Result<(), DriverError> { self.0.lock().press_key(key) }
    fn current_foreground(&mut self) -> Result<(String, String), DriverError> { self.0.lock().current_foreground() }
    fn current_page(&mut self) -> Result<(String, String), DriverError> { self.0.lock().current_page() }
    fn dump_ui_tree(&mut self) -> Result<UiNode, DriverError> { self.0.lock().dump_ui_tree() }
}
