use pyo3::prelude::*;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::types::PyBytes;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::camera::{Encoding, Image};
use crate::config::{BackendKind, HardwareConfig};
use crate::error::HwError;
use crate::hardware::HardwareController;

impl From<HwError> for PyErr{
    fn from(err: HwError) -> PyErr{
        match err{
            HwError::InvalidEncoding(_)
            | HwError::InvalidPin(_)
            | HwError::InvalidConfiguration(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

type Shared = Arc<Mutex<HardwareController>>;

fn lock(hw: &Shared) -> PyResult<MutexGuard<'_, HardwareController>>{
    hw.lock().map_err(|_| PyRuntimeError::new_err("hardware controller lock poisoned"))
}

#[pyclass(name = "Image")]
pub struct PyImage{
    inner: Image,
}

#[pymethods]
impl PyImage{
    #[new]
    #[pyo3(signature = (data=Vec::new(), width=0, height=0, encoding="png", has_header=false))]
    fn new(data: Vec<u8>, width: u32, height: u32, encoding: &str, has_header: bool) -> PyResult<Self>{
        let encoding: Encoding = encoding.parse()?;
        Ok(PyImage{ inner: Image::new(data, width, height, encoding, has_header) })
    }

    fn get_data<'py>(&self, py: Python<'py>) -> &'py PyBytes{
        PyBytes::new(py, self.inner.data())
    }

    fn get_size(&self) -> usize{
        self.inner.size()
    }

    fn get_width(&self) -> u32{
        self.inner.width()
    }

    fn get_height(&self) -> u32{
        self.inner.height()
    }

    fn get_encoding(&self) -> &'static str{
        self.inner.encoding().as_str()
    }

    fn get_has_header(&self) -> bool{
        self.inner.has_header()
    }

    fn save(&self, file_path: &str) -> PyResult<()>{
        Ok(self.inner.save(file_path)?)
    }

    fn save_as_png(&self, file_path: &str) -> PyResult<()>{
        Ok(self.inner.save_as_png(file_path)?)
    }

    fn remove_rgb_header(&mut self){
        self.inner.remove_rgb_header();
    }

    fn flip_rgb_h(&mut self){
        self.inner.flip_rgb_h();
    }

    fn flip_rgb_v(&mut self){
        self.inner.flip_rgb_v();
    }
}

fn standalone(simulated: bool, config_path: Option<&str>) -> PyResult<HardwareController>{
    let mut config = match config_path{
        Some(path) => crate::config::load_config(path)?,
        None => HardwareConfig::default(),
    };
    if simulated{
        config = config.with_backend(BackendKind::Simulated);
    }
    Ok(HardwareController::new(config))
}

/// View of the camera owned by a `HardwareController`. Constructed directly,
/// it owns a controller with only the camera initialized.
#[pyclass(name = "CameraController")]
pub struct PyCameraController{
    hw: Shared,
}

#[pymethods]
impl PyCameraController{
    #[new]
    #[pyo3(signature = (simulated=false, config_path=None))]
    fn new(simulated: bool, config_path: Option<&str>) -> PyResult<Self>{
        let mut hw = standalone(simulated, config_path)?;
        hw.initialize_camera()?;
        Ok(PyCameraController{ hw: Arc::new(Mutex::new(hw)) })
    }

    fn open_camera(&self) -> PyResult<()>{
        Ok(lock(&self.hw)?.camera_controller()?.open_camera()?)
    }

    fn capture_image(&self, py: Python<'_>) -> PyResult<PyImage>{
        let hw = Arc::clone(&self.hw);
        //capture blocks on the sensor, let other Python threads run
        let image = py.allow_threads(move ||{
            let mut guard = lock(&hw)?;
            let image = guard.camera_controller()?.capture_image()?;
            Ok::<_, PyErr>(image)
        })?;
        Ok(PyImage{ inner: image })
    }

    fn release_camera(&self) -> PyResult<()>{
        lock(&self.hw)?.camera_controller()?.release_camera();
        Ok(())
    }

    fn set_image_width(&self, new_width: u32) -> PyResult<()>{
        Ok(lock(&self.hw)?.camera_controller()?.set_image_width(new_width)?)
    }

    fn set_image_height(&self, new_height: u32) -> PyResult<()>{
        Ok(lock(&self.hw)?.camera_controller()?.set_image_height(new_height)?)
    }

    fn set_image_encoding(&self, new_encoding: &str) -> PyResult<()>{
        Ok(lock(&self.hw)?.camera_controller()?.set_image_encoding(new_encoding)?)
    }

    fn get_image_width(&self) -> PyResult<u32>{
        Ok(lock(&self.hw)?.camera_controller()?.image_width())
    }

    fn get_image_height(&self) -> PyResult<u32>{
        Ok(lock(&self.hw)?.camera_controller()?.image_height())
    }

    fn get_image_encoding(&self) -> PyResult<&'static str>{
        Ok(lock(&self.hw)?.camera_controller()?.image_encoding().as_str())
    }
}

/// View of the motor owned by a `HardwareController`. Constructed directly,
/// it owns a controller with only the motor initialized.
#[pyclass(name = "MotorController")]
pub struct PyMotorController{
    hw: Shared,
}

#[pymethods]
impl PyMotorController{
    #[new]
    #[pyo3(signature = (simulated=false, config_path=None))]
    fn new(simulated: bool, config_path: Option<&str>) -> PyResult<Self>{
        let mut hw = standalone(simulated, config_path)?;
        hw.initialize_motor()?;
        Ok(PyMotorController{ hw: Arc::new(Mutex::new(hw)) })
    }

    fn set_pins(&self, pin1: u8, pin2: u8, pin3: u8, pin4: u8) -> PyResult<()>{
        Ok(lock(&self.hw)?.motor_controller()?.set_pins(pin1, pin2, pin3, pin4)?)
    }

    fn set_to_output_mode(&self) -> PyResult<()>{
        Ok(lock(&self.hw)?.motor_controller()?.set_to_output_mode()?)
    }

    fn rotate(&self, py: Python<'_>, degrees: u32, direction: i32) -> PyResult<u32>{
        let hw = Arc::clone(&self.hw);
        py.allow_threads(move ||{
            let mut guard = lock(&hw)?;
            let steps = guard.motor_controller()?.rotate(degrees, direction)?;
            Ok(steps)
        })
    }

    fn cleanup(&self) -> PyResult<()>{
        Ok(lock(&self.hw)?.motor_controller()?.cleanup()?)
    }
}

#[pyclass(name = "HardwareController")]
pub struct PyHardwareController{
    inner: Shared,
}

#[pymethods]
impl PyHardwareController{
    #[new]
    #[pyo3(signature = (simulated=false, config_path=None))]
    fn new(simulated: bool, config_path: Option<&str>) -> PyResult<Self>{
        Ok(PyHardwareController{
            inner: Arc::new(Mutex::new(standalone(simulated, config_path)?)),
        })
    }

    fn initialize_all(&self) -> PyResult<()>{
        Ok(lock(&self.inner)?.initialize_all()?)
    }

    fn cleanup_all(&self) -> PyResult<()>{
        lock(&self.inner)?.cleanup_all();
        Ok(())
    }

    fn is_initialized(&self) -> PyResult<bool>{
        Ok(lock(&self.inner)?.is_initialized())
    }

    #[getter]
    fn camera_controller(&self) -> PyCameraController{
        PyCameraController{ hw: Arc::clone(&self.inner) }
    }

    #[getter]
    fn motor_controller(&self) -> PyMotorController{
        PyMotorController{ hw: Arc::clone(&self.inner) }
    }
}

#[pymodule]
fn raspi_hw_ctrl(_py: Python, m: &PyModule) -> PyResult<()>{
    m.add_class::<PyImage>()?;
    m.add_class::<PyCameraController>()?;
    m.add_class::<PyMotorController>()?;
    m.add_class::<PyHardwareController>()?;
    Ok(())
}
