//! Mobile navigation toggle, dropdown submenus and the header's scroll state

use crate::config::ScrollConfig;

fn aria(expanded: bool) -> &'static str {
    if expanded {
        "true"
    } else {
        "false"
    }
}

/// Hamburger menu state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavMenu {
    open: bool,
}

impl NavMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip the menu; returns the new open state
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Following a menu link closes the menu
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Value for the toggle button's `aria-expanded`
    pub fn aria_expanded(&self) -> &'static str {
        aria(self.open)
    }

    /// Page scrolling is locked while the menu covers it
    pub fn body_scroll_locked(&self) -> bool {
        self.open
    }
}

/// A submenu behind a `.dropdown-toggle` button
///
/// Each dropdown opens and closes on its own; opening one leaves the
/// others alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dropdown {
    expanded: bool,
}

impl Dropdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn aria_expanded(&self) -> &'static str {
        aria(self.expanded)
    }
}

/// Header styling that switches once the page scrolls past a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderState {
    threshold_px: f64,
    scrolled: bool,
}

impl HeaderState {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            scrolled: false,
        }
    }

    pub fn from_config(config: &ScrollConfig) -> Self {
        Self::new(config.header_scrolled_px)
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    /// Apply a scroll position; returns true if the scrolled state flipped
    pub fn on_scroll(&mut self, scroll_y: f64) -> bool {
        let scrolled = scroll_y > self.threshold_px;
        let changed = scrolled != self.scrolled;
        self.scrolled = scrolled;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_close() {
        let mut nav = NavMenu::new();
        assert_eq!(nav.aria_expanded(), "false");

        assert!(nav.toggle());
        assert_eq!(nav.aria_expanded(), "true");
        assert!(nav.body_scroll_locked());

        nav.close();
        assert!(!nav.is_open());
        assert!(!nav.body_scroll_locked());

        assert!(nav.toggle());
        assert!(!nav.toggle());
    }

    #[test]
    fn test_dropdowns_are_independent() {
        let mut products = Dropdown::new();
        let mut services = Dropdown::new();
        assert_eq!(products.aria_expanded(), "false");

        assert!(products.toggle());
        assert_eq!(products.aria_expanded(), "true");
        assert!(!services.is_open());

        services.toggle();
        assert!(!products.toggle());
        assert!(services.is_open());
    }

    #[test]
    fn test_header_scrolled_past_threshold() {
        let mut header = HeaderState::from_config(&ScrollConfig::default());
        assert!(!header.on_scroll(40.0));
        assert!(!header.on_scroll(100.0));
        assert!(!header.is_scrolled());

        assert!(header.on_scroll(101.0));
        assert!(header.is_scrolled());
        assert!(!header.on_scroll(600.0));

        assert!(header.on_scroll(0.0));
        assert!(!header.is_scrolled());
    }
}
