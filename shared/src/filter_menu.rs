//! Accessible single-select popover menu.
//!
//! The selected value lives outside the menu (in the dashboard filters); the
//! menu only owns whether it is open and which item has roving focus. Every
//! interaction returns a [`MenuResponse`] telling the caller which value was
//! chosen, if any, and where input focus must go.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_FILTER_VALUE;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub value: String,
    pub label: String,
}

impl MenuItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuKey {
    ArrowDown,
    ArrowUp,
    Home,
    End,
    Enter,
    Space,
    Escape,
    Tab,
}

impl MenuKey {
    /// Map a DOM `KeyboardEvent.key` value. Keys the menu ignores yield `None`.
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" | "Down" => Some(Self::ArrowDown),
            "ArrowUp" | "Up" => Some(Self::ArrowUp),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            "Enter" => Some(Self::Enter),
            " " | "Spacebar" => Some(Self::Space),
            "Escape" | "Esc" => Some(Self::Escape),
            "Tab" => Some(Self::Tab),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusRequest {
    Trigger,
    Item(usize),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MenuInput {
    Key(MenuKey),
    TriggerClicked,
    ItemClicked(usize),
    ItemHovered(usize),
    /// Pointer down anywhere outside the menu root.
    PointerOutside,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuResponse {
    /// Value to pass to the change handler.
    pub selected: Option<String>,
    pub focus: Option<FocusRequest>,
}

impl MenuResponse {
    fn focus(target: FocusRequest) -> Self {
        Self {
            selected: None,
            focus: Some(target),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.selected.is_none() && self.focus.is_none()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FilterMenu {
    label: String,
    default_label: String,
    /// Item 0 is always the default ("all") entry.
    items: Vec<MenuItem>,
    is_open: bool,
    active_index: usize,
}

impl FilterMenu {
    pub fn new(
        label: impl Into<String>,
        default_label: impl Into<String>,
        options: impl IntoIterator<Item = MenuItem>,
    ) -> Self {
        let default_label = default_label.into();
        let items = std::iter::once(MenuItem::new(DEFAULT_FILTER_VALUE, default_label.clone()))
            .chain(options)
            .collect();
        Self {
            label: label.into(),
            default_label,
            items,
            is_open: false,
            active_index: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Index of `value` in the item list; an empty or unknown value maps to
    /// the default item.
    pub fn selected_index(&self, value: &str) -> usize {
        let value = if value.is_empty() {
            DEFAULT_FILTER_VALUE
        } else {
            value
        };
        self.items
            .iter()
            .position(|item| item.value == value)
            .unwrap_or(0)
    }

    /// `"<label>: <selected label>"`, falling back to the default label.
    pub fn trigger_label(&self, value: &str) -> String {
        let selected = self
            .items
            .iter()
            .skip(1)
            .find(|item| !value.is_empty() && value != DEFAULT_FILTER_VALUE && item.value == value);
        match selected {
            Some(item) => format!("{}: {}", self.label, item.label),
            None => format!("{}: {}", self.label, self.default_label),
        }
    }

    pub fn open(&mut self, value: &str) -> MenuResponse {
        self.is_open = true;
        self.active_index = self.selected_index(value);
        MenuResponse::focus(FocusRequest::Item(self.active_index))
    }

    /// Close and hand focus back to the trigger. Closing a closed menu does
    /// nothing.
    pub fn close(&mut self) -> MenuResponse {
        if !self.is_open {
            return MenuResponse::default();
        }
        self.is_open = false;
        MenuResponse::focus(FocusRequest::Trigger)
    }

    pub fn handle(&mut self, input: MenuInput, value: &str) -> MenuResponse {
        match input {
            MenuInput::Key(key) if self.is_open => self.handle_menu_key(key),
            MenuInput::Key(key) => self.handle_trigger_key(key, value),
            MenuInput::TriggerClicked => {
                if self.is_open {
                    self.close()
                } else {
                    self.open(value)
                }
            }
            MenuInput::ItemClicked(index) if self.is_open && index < self.items.len() => {
                self.select(index)
            }
            MenuInput::ItemHovered(index) if self.is_open && index < self.items.len() => {
                self.active_index = index;
                MenuResponse::default()
            }
            MenuInput::PointerOutside => self.close(),
            MenuInput::ItemClicked(_) | MenuInput::ItemHovered(_) => MenuResponse::default(),
        }
    }

    fn handle_trigger_key(&mut self, key: MenuKey, value: &str) -> MenuResponse {
        match key {
            MenuKey::ArrowDown | MenuKey::ArrowUp | MenuKey::Enter | MenuKey::Space => {
                self.open(value)
            }
            MenuKey::Escape | MenuKey::Home | MenuKey::End | MenuKey::Tab => {
                MenuResponse::default()
            }
        }
    }

    fn handle_menu_key(&mut self, key: MenuKey) -> MenuResponse {
        let len = self.items.len();
        match key {
            MenuKey::ArrowDown => self.move_to((self.active_index + 1) % len),
            MenuKey::ArrowUp => self.move_to((self.active_index + len - 1) % len),
            MenuKey::Home => self.move_to(0),
            MenuKey::End => self.move_to(len - 1),
            MenuKey::Enter | MenuKey::Space => self.select(self.active_index),
            MenuKey::Escape => self.close(),
            // Focus leaves naturally; no focus request.
            MenuKey::Tab => {
                self.is_open = false;
                MenuResponse::default()
            }
        }
    }

    fn move_to(&mut self, index: usize) -> MenuResponse {
        self.active_index = index;
        MenuResponse::focus(FocusRequest::Item(index))
    }

    fn select(&mut self, index: usize) -> MenuResponse {
        let selected = self.items.get(index).map(|item| item.value.clone());
        self.is_open = false;
        MenuResponse {
            selected,
            focus: Some(FocusRequest::Trigger),
        }
    }
}
