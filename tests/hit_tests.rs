//! Hardware-in-the-loop tests. Need a Pi with a camera on the CSI port and a
//! stepper on wiringPi pins 25, 24, 23, 22. Run with `--features hit`.

#[cfg(feature = "hit")]
use raspi_hw_ctrl::{HardwareConfig, HardwareController, HwResult};

#[cfg(feature = "hit")]
#[test]
fn capture_and_rotate_on_device() -> HwResult<()> {
    let mut hw = HardwareController::new(HardwareConfig::default());
    hw.initialize_all()?;

    let cc = hw.camera_controller()?;
    cc.set_image_encoding("png")?;
    cc.open_camera()?;
    let img = cc.capture_image()?;
    let decoded = img.decode()?;
    assert_eq!((decoded.width(), decoded.height()), (320, 240));

    let mc = hw.motor_controller()?;
    mc.set_to_output_mode()?;
    mc.rotate(90, 1)?;
    mc.rotate(90, -1)?;

    hw.cleanup_all();
    Ok(())
}
