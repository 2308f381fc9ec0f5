// Copyright 2026 the Orogeny Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration model for container override requests.
//!
//! A container carries a *requested override configuration*: a partial
//! configuration whose populated axes are described by two bitmasks, one for
//! the outer configuration ([`CONFIG_SCREEN_SIZE`],
//! [`CONFIG_SMALLEST_SCREEN_SIZE`], [`CONFIG_WINDOW_CONFIGURATION`]) and one
//! for the nested window configuration ([`WINDOW_CONFIG_BOUNDS`],
//! [`WINDOW_CONFIG_APP_BOUNDS`]). Transactions ship partial configurations
//! plus masks; [`Configuration::set_to`] merges only the masked axes.
//!
//! Organizers are not trusted to name arbitrary axes: incoming masks are
//! intersected with the [`CONTROLLABLE_CONFIGS`] and
//! [`CONTROLLABLE_WINDOW_CONFIGS`] allow-lists before any merge.

use kurbo::Rect;

/// The window-configuration axis of the configuration mask.
pub const CONFIG_WINDOW_CONFIGURATION: u32 = 1 << 0;

/// The screen width/height axis of the configuration mask.
pub const CONFIG_SCREEN_SIZE: u32 = 1 << 1;

/// The smallest-screen-width axis of the configuration mask.
pub const CONFIG_SMALLEST_SCREEN_SIZE: u32 = 1 << 2;

/// Configuration axes organizers are allowed to control. Incoming
/// transactions are filtered to this set.
pub const CONTROLLABLE_CONFIGS: u32 =
    CONFIG_WINDOW_CONFIGURATION | CONFIG_SCREEN_SIZE | CONFIG_SMALLEST_SCREEN_SIZE;

/// The bounds axis of the window-configuration mask.
pub const WINDOW_CONFIG_BOUNDS: u32 = 1 << 0;

/// The app-bounds axis of the window-configuration mask.
pub const WINDOW_CONFIG_APP_BOUNDS: u32 = 1 << 1;

/// Window-configuration axes organizers are allowed to control.
pub const CONTROLLABLE_WINDOW_CONFIGS: u32 = WINDOW_CONFIG_BOUNDS | WINDOW_CONFIG_APP_BOUNDS;

/// How a container's windows are arranged on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowingMode {
    /// No mode requested; inherit from the parent.
    #[default]
    Undefined,
    /// The container fills its display area.
    Fullscreen,
    /// The container shares the display area with siblings.
    MultiWindow,
    /// Freely positioned, user-resizable windows.
    Freeform,
    /// Pinned picture-in-picture window.
    Pinned,
}

impl WindowingMode {
    /// Returns whether this mode places windows alongside other containers.
    ///
    /// Fullscreen and pinned containers own their screen region exclusively;
    /// an undefined mode defers to the parent and is not itself
    /// multi-window.
    #[must_use]
    pub const fn is_multi_window(self) -> bool {
        matches!(self, Self::MultiWindow | Self::Freeform)
    }
}

/// What kind of activity a task hosts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActivityType {
    /// Unclassified.
    #[default]
    Undefined,
    /// An ordinary application.
    Standard,
    /// The home/launcher surface.
    Home,
    /// The recents/overview surface.
    Recents,
    /// The assistant surface.
    Assistant,
}

/// The window-level portion of a configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowConfiguration {
    /// Requested window bounds in display coordinates.
    pub bounds: Rect,
    /// Requested application bounds, if constrained separately from the
    /// window bounds.
    pub app_bounds: Option<Rect>,
}

impl WindowConfiguration {
    /// Copies the axes named by `window_mask` from `other` into `self`.
    pub fn set_to(&mut self, other: &Self, window_mask: u32) {
        if window_mask & WINDOW_CONFIG_BOUNDS != 0 {
            self.bounds = other.bounds;
        }
        if window_mask & WINDOW_CONFIG_APP_BOUNDS != 0 {
            self.app_bounds = other.app_bounds;
        }
    }
}

/// A partial container configuration.
///
/// Only the axes named by an accompanying mask are meaningful; unmasked
/// fields are ignored by [`set_to`](Self::set_to).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    /// Available screen width in dp.
    pub screen_width_dp: u32,
    /// Available screen height in dp.
    pub screen_height_dp: u32,
    /// Smallest screen width in dp across rotations.
    pub smallest_screen_width_dp: u32,
    /// The window-level configuration.
    pub window: WindowConfiguration,
}

impl Configuration {
    /// Copies the axes named by `config_mask` (and, within the window
    /// configuration, `window_mask`) from `other` into `self`. Unmasked axes
    /// are left untouched.
    pub fn set_to(&mut self, other: &Self, config_mask: u32, window_mask: u32) {
        if config_mask & CONFIG_SCREEN_SIZE != 0 {
            self.screen_width_dp = other.screen_width_dp;
            self.screen_height_dp = other.screen_height_dp;
        }
        if config_mask & CONFIG_SMALLEST_SCREEN_SIZE != 0 {
            self.smallest_screen_width_dp = other.smallest_screen_width_dp;
        }
        if config_mask & CONFIG_WINDOW_CONFIGURATION != 0 {
            self.window.set_to(&other.window, window_mask);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_to_copies_only_masked_axes() {
        let mut base = Configuration {
            screen_width_dp: 400,
            screen_height_dp: 800,
            smallest_screen_width_dp: 400,
            window: WindowConfiguration {
                bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
                app_bounds: None,
            },
        };
        let incoming = Configuration {
            screen_width_dp: 600,
            screen_height_dp: 1200,
            smallest_screen_width_dp: 600,
            window: WindowConfiguration {
                bounds: Rect::new(0.0, 0.0, 50.0, 50.0),
                app_bounds: Some(Rect::new(0.0, 0.0, 40.0, 40.0)),
            },
        };

        base.set_to(&incoming, CONFIG_SCREEN_SIZE, 0);
        assert_eq!(base.screen_width_dp, 600);
        assert_eq!(base.screen_height_dp, 1200);
        // Unmasked axes untouched.
        assert_eq!(base.smallest_screen_width_dp, 400);
        assert_eq!(base.window.bounds, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(base.window.app_bounds, None);
    }

    #[test]
    fn set_to_merges_window_configuration_by_window_mask() {
        let mut base = Configuration::default();
        let incoming = Configuration {
            window: WindowConfiguration {
                bounds: Rect::new(10.0, 10.0, 110.0, 210.0),
                app_bounds: Some(Rect::new(10.0, 10.0, 60.0, 60.0)),
            },
            ..Configuration::default()
        };

        base.set_to(&incoming, CONFIG_WINDOW_CONFIGURATION, WINDOW_CONFIG_BOUNDS);
        assert_eq!(base.window.bounds, Rect::new(10.0, 10.0, 110.0, 210.0));
        assert_eq!(base.window.app_bounds, None, "app bounds were not masked");

        base.set_to(
            &incoming,
            CONFIG_WINDOW_CONFIGURATION,
            WINDOW_CONFIG_APP_BOUNDS,
        );
        assert_eq!(
            base.window.app_bounds,
            Some(Rect::new(10.0, 10.0, 60.0, 60.0))
        );
    }

    #[test]
    fn window_configuration_needs_config_mask_bit() {
        let mut base = Configuration::default();
        let incoming = Configuration {
            window: WindowConfiguration {
                bounds: Rect::new(0.0, 0.0, 9.0, 9.0),
                app_bounds: None,
            },
            ..Configuration::default()
        };

        // Window mask alone does nothing without CONFIG_WINDOW_CONFIGURATION.
        base.set_to(&incoming, 0, WINDOW_CONFIG_BOUNDS);
        assert_eq!(base.window.bounds, Rect::default());
    }

    #[test]
    fn multi_window_modes() {
        assert!(WindowingMode::MultiWindow.is_multi_window());
        assert!(WindowingMode::Freeform.is_multi_window());
        assert!(!WindowingMode::Fullscreen.is_multi_window());
        assert!(!WindowingMode::Pinned.is_multi_window());
        assert!(!WindowingMode::Undefined.is_multi_window());
    }
}
