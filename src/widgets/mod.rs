//! Page widgets that share the loader's runtime and config
//!
//! The hero slider, the simulated contact form, navigation toggles and
//! scroll-driven reveals.

pub mod form;
pub mod nav;
pub mod reveal;
pub mod slider;

pub use form::{ContactForm, FormSimulator, FormState};
pub use nav::{Dropdown, HeaderState, NavMenu};
pub use reveal::{play_reveals, visibility_ratio, Intersection, RevealObserver, RevealStep};
pub use slider::{spawn_slider, HeroSlider, SliderCommand, SliderHandle, SliderKey, SwipeDirection};
