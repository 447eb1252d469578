//! Stable display colors
//!
//! Each callback name maps to a fixed `#RRGGBB` color so that repeated report
//! runs render identically.

use fnv::FnvHasher;
use std::hash::Hasher;

/// Display color for a callback name
pub fn color_for(name: &str) -> String {
    let mut hasher = FnvHasher::default();
    hasher.write(name.as_bytes());
    format!("#{:06X}", hasher.finish() & 0x00FF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_format() {
        let color = color_for("node_FrontLidarDriver");
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_color_is_stable() {
        assert_eq!(color_for("node_A"), color_for("node_A"));
        assert_ne!(color_for("node_A"), color_for("node_B"));
    }

    #[test]
    fn test_known_value() {
        // FNV-1a 64 of the empty input is the offset basis 0xcbf29ce484222325
        assert_eq!(color_for(""), "#222325");
    }
}
