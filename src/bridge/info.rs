//! Device-info extraction: descriptive record built once per tick and
//! emitted only when it differs from the previous tick's serialized form.

use super::messages::GamepadInfo;
use super::source::PadSnapshot;
use regex::Regex;
use std::sync::OnceLock;

fn vendor_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)Vendor:\s?([0-9a-f]+)").expect("vendor pattern is valid"),
            Regex::new(r"(?i)VID_([0-9a-f]+)").expect("vendor pattern is valid"),
        ]
    })
}

fn product_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)Product:\s?([0-9a-f]+)").expect("product pattern is valid"),
            Regex::new(r"(?i)PID_([0-9a-f]+)").expect("product pattern is valid"),
        ]
    })
}

fn capture_first(patterns: &[Regex], id: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|p| p.captures(id))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pull vendor/product hex identifiers out of a device id string. Both the
/// `Vendor: xxxx` / `Product: xxxx` and the `VID_xxxx` / `PID_xxxx` spellings
/// are recognized.
pub fn parse_vendor_product(id: &str) -> (Option<String>, Option<String>) {
    (
        capture_first(vendor_patterns(), id),
        capture_first(product_patterns(), id),
    )
}

/// Build the descriptive record for the current tick. A missing snapshot
/// yields the disconnected record, not an error.
pub fn build_info(snapshot: Option<&PadSnapshot>) -> GamepadInfo {
    match snapshot {
        Some(pad) => {
            let (vendor, product) = parse_vendor_product(&pad.id);
            GamepadInfo {
                connected: true,
                index: Some(pad.index),
                id: Some(pad.id.clone()),
                mapping: Some(pad.mapping.clone()),
                timestamp: Some(pad.timestamp),
                can_vibrate: pad.can_vibrate,
                vendor,
                product,
                axes: pad.axes.len(),
                buttons: pad.buttons.len(),
            }
        }
        None => GamepadInfo::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::source::testing::idle_snapshot;

    #[test]
    fn vendor_and_product_parse_from_descriptive_ids() {
        let (vendor, product) =
            parse_vendor_product("Xbox Wireless Controller (Vendor: 045e Product: 02fd)");
        assert_eq!(vendor.as_deref(), Some("045e"));
        assert_eq!(product.as_deref(), Some("02fd"));
    }

    #[test]
    fn vendor_and_product_parse_from_vid_pid_ids() {
        let (vendor, product) = parse_vendor_product("HID-compliant pad VID_054C&PID_09CC");
        assert_eq!(vendor.as_deref(), Some("054C"));
        assert_eq!(product.as_deref(), Some("09CC"));
    }

    #[test]
    fn ids_without_identifiers_yield_none() {
        let (vendor, product) = parse_vendor_product("Generic USB Joystick");
        assert_eq!(vendor, None);
        assert_eq!(product, None);
    }

    #[test]
    fn missing_snapshot_builds_the_disconnected_record() {
        let info = build_info(None);
        assert!(!info.connected);
        assert_eq!(info.id, None);
        assert_eq!(info.buttons, 0);
        assert_eq!(info.axes, 0);
    }

    #[test]
    fn snapshot_fields_flow_into_the_record() {
        let pad = idle_snapshot();
        let info = build_info(Some(&pad));
        assert!(info.connected);
        assert_eq!(info.index, Some(0));
        assert_eq!(info.mapping.as_deref(), Some("standard"));
        assert_eq!(info.vendor.as_deref(), Some("045e"));
        assert_eq!(info.product.as_deref(), Some("028e"));
        assert_eq!(info.buttons, 17);
        assert_eq!(info.axes, 4);
        assert!(info.can_vibrate);
    }
}
