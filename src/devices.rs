//! Manual on/off control for the fixed device set.
//!
//! There are no interlocks: switching the 3-phase motor off leaves the
//! water pump running, and nothing here reacts to sensor state. A real rig
//! would need both; they are out of scope for this controller.

use tracing::info;

use crate::error::CoreError;
use crate::models::{DeviceId, DeviceState};

// ---

#[derive(Debug, Clone, Default)]
pub struct DeviceController {
    state: DeviceState,
}

impl DeviceController {
    pub fn new(initial: DeviceState) -> Self {
        Self { state: initial }
    }

    /// Flip the device named `id` and return the full new state.
    ///
    /// Fails with [`CoreError::UnknownDevice`] for ids outside the fixed set,
    /// leaving every flag untouched.
    pub fn toggle(&mut self, id: &str) -> Result<DeviceState, CoreError> {
        // ---
        let device: DeviceId = id.parse()?;
        Ok(self.toggle_device(device))
    }

    pub fn toggle_device(&mut self, device: DeviceId) -> DeviceState {
        // ---
        let slot = self.state.slot_mut(device);
        *slot = !*slot;
        info!(device = %device, on = *slot, "device toggled");
        self.state
    }

    pub fn get(&self, id: &str) -> Result<bool, CoreError> {
        let device: DeviceId = id.parse()?;
        Ok(self.state.get(device))
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_toggle_water_pump_twice() {
        // ---
        let mut controller = DeviceController::new(DeviceState::default());
        assert!(!assert_ok!(controller.get("waterPump")));

        let on = assert_ok!(controller.toggle("waterPump"));
        assert!(on.water_pump);

        let off = assert_ok!(controller.toggle("waterPump"));
        assert!(!off.water_pump);
    }

    #[test]
    fn test_toggle_is_self_inverse_for_every_device() {
        // ---
        let initial = DeviceState {
            water_pump: false,
            motor_3_phase: true,
            irrigation: false,
            ventilation: true,
        };
        for device in DeviceId::ALL {
            let mut controller = DeviceController::new(initial);
            controller.toggle_device(device);
            controller.toggle_device(device);
            assert_eq!(controller.state(), initial, "{} not self-inverse", device);
        }
    }

    #[test]
    fn test_toggle_touches_only_the_named_device() {
        // ---
        let mut controller = DeviceController::new(DeviceState::default());
        let state = controller.toggle_device(DeviceId::Motor3Phase);
        assert!(state.motor_3_phase);
        assert!(!state.water_pump, "no interlock: pump unaffected by motor");
        assert!(!state.irrigation);
        assert!(!state.ventilation);
    }

    #[test]
    fn test_unknown_device_fails_and_leaves_state_unchanged() {
        // ---
        let mut controller = DeviceController::new(DeviceState::default());
        let before = controller.state();

        let err = assert_err!(controller.toggle("sprinkler"));
        assert_eq!(
            err,
            CoreError::UnknownDevice {
                id: "sprinkler".to_string()
            }
        );
        assert_eq!(controller.state(), before);
        assert!(controller.get("sprinkler").is_err());
    }
}
