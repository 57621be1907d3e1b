//! Protocol constants

/// Marker byte leading every request and response frame
pub const FRAME_MARKER: u8 = 0x40;

/// Number of captures needed to enroll a finger
pub const ENROLL_TIMES: u8 = 8;

/// Number of template slots on the sensor
pub const MAX_PRINTS: u8 = 10;

/// Default bulk OUT timeout (milliseconds)
pub const USB_SEND_TIMEOUT_MS: u64 = 10_000;

/// Default bulk IN timeout (milliseconds)
pub const USB_RECV_TIMEOUT_MS: u64 = 10_000;

/// USB interface claimed on open
pub const USB_INTERFACE: u8 = 0;

/// USB endpoints
pub mod endpoints {
    /// Command OUT endpoint
    pub const CMD_OUT: u8 = 0x01;

    /// Command IN endpoint
    pub const CMD_IN: u8 = 0x83;

    /// Match-on-chip IN endpoint (capture results)
    pub const MOC_CMD_IN: u8 = 0x84;
}

/// Sensor status codes
pub mod status {
    /// Generic success
    pub const OK: u8 = 0x00;

    /// Enroll stage accepted (alternate success code)
    pub const ENROLL_STAGE_OK: u8 = 0x03;

    pub const MOVE_DOWN: u8 = 0x41;
    pub const MOVE_RIGHT: u8 = 0x42;
    pub const MOVE_UP: u8 = 0x43;
    pub const MOVE_LEFT: u8 = 0x44;

    /// Storage is full
    pub const MAX_ENROLLED_REACHED: u8 = 0xdd;

    /// Sensor surface is dirty or wet
    pub const SENSOR_DIRTY: u8 = 0xfb;

    /// Finger is not enrolled
    pub const NOT_ENROLLED: u8 = 0xfd;

    /// Finger does not cover enough of the sensor
    pub const NOT_ENOUGH_SURFACE: u8 = 0xfe;

    /// No finger detected yet
    pub const NO_FINGER: u8 = 0xff;
}

/// Driver name reported in device info
pub const DRIVER_FULL_NAME: &str = "ELAN Match-on-Chip 2";
