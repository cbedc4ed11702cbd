use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use climavote_core::PinFault;
use climavote_core::indicator::OutputPin;

/// Legacy `/sys/class/gpio` interface; pins are exported as outputs on first use.
pub struct SysfsGpio {
    root: PathBuf,
    exported: HashSet<u8>,
}

impl SysfsGpio {
    pub fn new(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
            exported: HashSet::new(),
        }
    }

    fn fault(pin: u8, error: std::io::Error) -> PinFault {
        PinFault {
            pin,
            reason: error.to_string(),
        }
    }

    fn ensure_output(&mut self, pin: u8) -> Result<PathBuf, PinFault> {
        let pin_dir = self.root.join(format!("gpio{pin}"));

        if !self.exported.contains(&pin) {
            if !pin_dir.exists() {
                fs::write(self.root.join("export"), pin.to_string()).map_err(|e| Self::fault(pin, e))?;
            }
            fs::write(pin_dir.join("direction"), "out").map_err(|e| Self::fault(pin, e))?;
            self.exported.insert(pin);
            tracing::debug!("exported GPIO{} as output", pin);
        }

        Ok(pin_dir)
    }
}

impl OutputPin for SysfsGpio {
    fn write(&mut self, pin: u8, on: bool) -> Result<(), PinFault> {
        let pin_dir = self.ensure_output(pin)?;

        fs::write(pin_dir.join("value"), if on { "1" } else { "0" }).map_err(|e| Self::fault(pin, e))
    }
}
