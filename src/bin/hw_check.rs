/**
 * Hardware Check Binary
 *
 * Exercises the whole controller end to end:
 * 1. Captures an image and saves it
 * 2. Verifies the saved image decodes at the configured size
 * 3. Rotates the motor one way and back
 * 4. Releases the camera and returns the GPIO pins to input
 *
 * Settings come from the defaults, then the --config file, then the flags.
 *
 * Usage: hw_check [--encoding png|jpeg|rgb] [--simulate] [--config hw.toml]
 */

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use raspi_hw_ctrl::{BackendKind, Direction, Encoding, HardwareConfig, HardwareController};

#[derive(Parser, Debug)]
#[command(name = "hw_check", about = "Capture an image and turn the stepper motor both ways")]
struct Args {
    /// TOML file with camera/motor settings; flags below override it
    #[arg(short, long)]
    config: Option<String>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// png, jpeg or rgb [default: png]
    #[arg(short, long)]
    encoding: Option<Encoding>,

    /// Where the captured image is written [default: ./test_img.<png|jpg>]
    #[arg(short, long)]
    output: Option<String>,

    /// Four motor pins, numbered as the config says [default: 25,24,23,22 wiringPi]
    #[arg(long, value_delimiter = ',')]
    pins: Option<Vec<u8>>,

    /// Degrees to rotate in each direction
    #[arg(long, default_value_t = 90)]
    degrees: u32,

    /// Use the simulated camera and GPIO instead of real hardware
    #[arg(long)]
    simulate: bool,
}

/// Lay the flags the user actually gave over `config`.
fn apply_args(mut config: HardwareConfig, args: &Args) -> Result<HardwareConfig> {
    if let Some(width) = args.width {
        config.camera.image_width = width;
    }
    if let Some(height) = args.height {
        config.camera.image_height = height;
    }
    if let Some(encoding) = args.encoding {
        config.camera.encoding = encoding;
    }
    if let Some(pins) = &args.pins {
        config.motor.pins = match pins.as_slice().try_into() {
            Ok(pins) => pins,
            Err(_) => bail!("expected 4 motor pins, got {}", pins.len()),
        };
    }
    if args.simulate {
        config = config.with_backend(BackendKind::Simulated);
    }
    config.validate()?;
    Ok(config)
}

fn load(args: &Args) -> Result<HardwareConfig> {
    let config = match &args.config {
        Some(path) => raspi_hw_ctrl::load_config(path).with_context(|| format!("loading {}", path))?,
        None => HardwareConfig::default(),
    };
    apply_args(config, args)
}

//rgb captures are converted to PNG before saving
fn output_path(args: &Args, encoding: Encoding) -> String {
    match &args.output {
        Some(path) => path.clone(),
        None => match encoding {
            Encoding::Jpeg => "./test_img.jpg".to_string(),
            Encoding::Png | Encoding::Rgb => "./test_img.png".to_string(),
        },
    }
}

fn capture(hw: &mut HardwareController, output: &str) -> Result<()> {
    let cc = hw.camera_controller()?;
    cc.open_camera().context("opening camera")?;
    let mut img = cc.capture_image().context("capturing image")?;
    let (width, height) = (img.width(), img.height());

    match img.encoding() {
        Encoding::Png | Encoding::Jpeg => {
            img.save(output).with_context(|| format!("saving {}", output))?;
            let saved = std::fs::read(output)?;
            let decoded = image::load_from_memory(&saved).context("decoding saved image")?;
            if (decoded.width(), decoded.height()) != (width, height) {
                bail!(
                    "saved image is {}x{}, expected {}x{}",
                    decoded.width(),
                    decoded.height(),
                    width,
                    height
                );
            }
        }
        Encoding::Rgb => {
            img.remove_rgb_header();
            img.flip_rgb_v();
            let expected = width as usize * height as usize * 3;
            if img.size() != expected {
                bail!("rgb buffer is {} bytes, expected {}", img.size(), expected);
            }
            img.save_as_png(output).with_context(|| format!("saving {}", output))?;
        }
    }
    info!("image saved to {} ({}x{} {})", output, width, height, img.encoding());
    Ok(())
}

fn spin(hw: &mut HardwareController, degrees: u32) -> Result<()> {
    let mc = hw.motor_controller()?;
    mc.set_to_output_mode()?;
    let steps = mc.rotate(degrees, Direction::Clockwise)?;
    info!("rotated {} degrees clockwise ({} steps)", degrees, steps);
    mc.rotate(degrees, Direction::CounterClockwise)?;
    info!("rotated {} degrees counter-clockwise", degrees);
    Ok(())
}

fn run(config: HardwareConfig, output: &str, degrees: u32) -> Result<()> {
    let mut hw = HardwareController::new(config);
    hw.initialize_all().context("initializing hardware")?;

    capture(&mut hw, output)?;
    spin(&mut hw, degrees)?;

    info!("cleaning up hardware");
    hw.cleanup_all();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load(&args)?;
    let output = output_path(&args, config.camera.encoding);

    println!("==============================================");
    println!("  Raspberry Pi Hardware Check");
    println!("==============================================");
    println!("  Backend:  {:?}", config.backend);
    println!("  Encoding: {}", config.camera.encoding);
    println!("  Output:   {}", output);
    println!("  Pins:     {:?} ({:?})", config.motor.pins, config.motor.numbering);
    println!("==============================================\n");

    run(config, &output, args.degrees)
}
