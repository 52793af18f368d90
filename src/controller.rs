//! Signal tower controller abstraction.

use bytes::Bytes;

use crate::{Color, Pattern};

/// HID signal tower controller.
pub(crate) trait TowerController {
    /// HID vendor ID.
    fn vendor_id(&self) -> u16;

    /// HID product ID.
    fn product_id(&self) -> u16;

    /// Convert a light setting to the controller-specific command report.
    fn command_bytes(&self, color: Color, pattern: Pattern) -> Bytes;
}
