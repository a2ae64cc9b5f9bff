use std::ffi::{c_char, CStr};
use std::ptr;

use log::warn;

use crate::camera::Image;
use crate::config::HardwareConfig;
use crate::error::HwResult;
use crate::hardware::HardwareController;

pub const RHC_OK: i32 = 0;
pub const RHC_ERR_NULL: i32 = -1;
pub const RHC_ERR_FAILED: i32 = -2;

pub struct RhcHardware{
    inner: HardwareController,
}

pub struct RhcImage{
    inner: Image,
}

fn status(result: HwResult<()>) -> i32{
    match result{
        Ok(()) => RHC_OK,
        Err(e) =>{
            warn!("{}", e);
            RHC_ERR_FAILED
        }
    }
}

#[no_mangle]
pub extern "C" fn rhc_hardware_new() -> *mut RhcHardware{
    let hw = Box::new(RhcHardware{
        inner: HardwareController::new(HardwareConfig::default()),
    });
    Box::into_raw(hw)
}

#[no_mangle]
pub extern "C" fn rhc_hardware_new_simulated() -> *mut RhcHardware{
    let hw = Box::new(RhcHardware{
        inner: HardwareController::new(HardwareConfig::simulated()),
    });
    Box::into_raw(hw)
}

/// Frees the handle. Hardware still held is cleaned up first.
#[no_mangle]
pub unsafe extern "C" fn rhc_hardware_free(hw: *mut RhcHardware){
    if !hw.is_null(){
        unsafe{ drop(Box::from_raw(hw)); }
    }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_initialize_all(hw: *mut RhcHardware) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{ status((*hw).inner.initialize_all()) }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_cleanup_all(hw: *mut RhcHardware) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{ (*hw).inner.cleanup_all(); }
    RHC_OK
}

#[no_mangle]
pub unsafe extern "C" fn rhc_camera_set_image_width(hw: *mut RhcHardware, width: u32) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.camera_controller().and_then(|cc| cc.set_image_width(width)))
}

#[no_mangle]
pub unsafe extern "C" fn rhc_camera_set_image_height(hw: *mut RhcHardware, height: u32) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.camera_controller().and_then(|cc| cc.set_image_height(height)))
}

/// `encoding` is a NUL-terminated "png", "jpeg" or "rgb".
#[no_mangle]
pub unsafe extern "C" fn rhc_camera_set_image_encoding(hw: *mut RhcHardware, encoding: *const c_char) -> i32{
    if hw.is_null() || encoding.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{
        let hw = &mut *hw;
        let encoding = match CStr::from_ptr(encoding).to_str(){
            Ok(s) => s,
            Err(_) => return RHC_ERR_FAILED,
        };
        status(hw.inner.camera_controller().and_then(|cc| cc.set_image_encoding(encoding)))
    }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_camera_open(hw: *mut RhcHardware) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.camera_controller().and_then(|cc| cc.open_camera()))
}

#[no_mangle]
pub unsafe extern "C" fn rhc_camera_release(hw: *mut RhcHardware) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.camera_controller().map(|cc| cc.release_camera()))
}

/// Returns null on failure. Free the image with `rhc_image_free`.
#[no_mangle]
pub unsafe extern "C" fn rhc_camera_capture(hw: *mut RhcHardware) -> *mut RhcImage{
    if hw.is_null(){
        return ptr::null_mut();
    }
    let hw = unsafe{ &mut *hw };
    match hw.inner.camera_controller().and_then(|cc| cc.capture_image()){
        Ok(image) => Box::into_raw(Box::new(RhcImage{ inner: image })),
        Err(e) =>{
            warn!("{}", e);
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_free(image: *mut RhcImage){
    if !image.is_null(){
        unsafe{ drop(Box::from_raw(image)); }
    }
}

/// Borrowed pointer to the image bytes, valid until the image is mutated or freed.
#[no_mangle]
pub unsafe extern "C" fn rhc_image_data(image: *const RhcImage, out_len: *mut usize) -> *const u8{
    if image.is_null(){
        return ptr::null();
    }
    unsafe{
        let img = &(*image).inner;
        if !out_len.is_null(){
            *out_len = img.size();
        }
        img.data().as_ptr()
    }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_width(image: *const RhcImage) -> u32{
    if image.is_null(){
        return 0;
    }
    unsafe{ (*image).inner.width() }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_height(image: *const RhcImage) -> u32{
    if image.is_null(){
        return 0;
    }
    unsafe{ (*image).inner.height() }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_has_header(image: *const RhcImage) -> bool{
    if image.is_null(){
        return false;
    }
    unsafe{ (*image).inner.has_header() }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_remove_rgb_header(image: *mut RhcImage) -> i32{
    if image.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{ (*image).inner.remove_rgb_header(); }
    RHC_OK
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_flip_rgb_h(image: *mut RhcImage) -> i32{
    if image.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{ (*image).inner.flip_rgb_h(); }
    RHC_OK
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_flip_rgb_v(image: *mut RhcImage) -> i32{
    if image.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{ (*image).inner.flip_rgb_v(); }
    RHC_OK
}

#[no_mangle]
pub unsafe extern "C" fn rhc_image_save(image: *const RhcImage, path: *const c_char) -> i32{
    if image.is_null() || path.is_null(){
        return RHC_ERR_NULL;
    }
    unsafe{
        let path = match CStr::from_ptr(path).to_str(){
            Ok(s) => s,
            Err(_) => return RHC_ERR_FAILED,
        };
        status((*image).inner.save(path))
    }
}

#[no_mangle]
pub unsafe extern "C" fn rhc_motor_set_pins(hw: *mut RhcHardware, pin1: u8, pin2: u8, pin3: u8, pin4: u8) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.motor_controller().and_then(|mc| mc.set_pins(pin1, pin2, pin3, pin4)))
}

#[no_mangle]
pub unsafe extern "C" fn rhc_motor_set_to_output_mode(hw: *mut RhcHardware) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.motor_controller().and_then(|mc| mc.set_to_output_mode()))
}

/// `direction` 1 is clockwise, anything else counter-clockwise.
#[no_mangle]
pub unsafe extern "C" fn rhc_motor_rotate(hw: *mut RhcHardware, degrees: u32, direction: i32) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.motor_controller().and_then(|mc| mc.rotate(degrees, direction)).map(|_| ()))
}

#[no_mangle]
pub unsafe extern "C" fn rhc_motor_cleanup(hw: *mut RhcHardware) -> i32{
    if hw.is_null(){
        return RHC_ERR_NULL;
    }
    let hw = unsafe{ &mut *hw };
    status(hw.inner.motor_controller().and_then(|mc| mc.cleanup()))
}

#[cfg(test)]
mod tests{
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_ffi_hardware_create_free(){
        let hw = rhc_hardware_new_simulated();
        assert!(!hw.is_null());
        unsafe{ rhc_hardware_free(hw); }
    }

    #[test]
    fn test_ffi_null_handles(){
        unsafe{
            assert_eq!(rhc_initialize_all(ptr::null_mut()), RHC_ERR_NULL);
            assert_eq!(rhc_motor_rotate(ptr::null_mut(), 90, 1), RHC_ERR_NULL);
            assert!(rhc_camera_capture(ptr::null_mut()).is_null());
            assert_eq!(rhc_image_width(ptr::null()), 0);
        }
    }

    #[test]
    fn test_ffi_not_initialized(){
        let hw = rhc_hardware_new_simulated();
        unsafe{
            assert_eq!(rhc_camera_open(hw), RHC_ERR_FAILED);
            rhc_hardware_free(hw);
        }
    }

    #[test]
    fn test_ffi_rgb_capture(){
        let hw = rhc_hardware_new_simulated();
        let encoding = CString::new("rgb").unwrap();

        unsafe{
            assert_eq!(rhc_initialize_all(hw), RHC_OK);
            assert_eq!(rhc_camera_set_image_encoding(hw, encoding.as_ptr()), RHC_OK);
            assert_eq!(rhc_camera_open(hw), RHC_OK);

            let img = rhc_camera_capture(hw);
            assert!(!img.is_null());
            assert!(rhc_image_has_header(img));
            assert_eq!(rhc_image_remove_rgb_header(img), RHC_OK);
            assert_eq!(rhc_image_flip_rgb_v(img), RHC_OK);

            let mut len: usize = 0;
            let data = rhc_image_data(img, &mut len);
            assert!(!data.is_null());
            assert_eq!(len, (rhc_image_width(img) * rhc_image_height(img) * 3) as usize);

            rhc_image_free(img);
            assert_eq!(rhc_cleanup_all(hw), RHC_OK);
            rhc_hardware_free(hw);
        }
    }

    #[test]
    fn test_ffi_bad_encoding(){
        let hw = rhc_hardware_new_simulated();
        let encoding = CString::new("gif").unwrap();
        unsafe{
            rhc_initialize_all(hw);
            assert_eq!(rhc_camera_set_image_encoding(hw, encoding.as_ptr()), RHC_ERR_FAILED);
            rhc_hardware_free(hw);
        }
    }

    #[test]
    fn test_ffi_motor(){
        let hw = rhc_hardware_new_simulated();
        unsafe{
            rhc_initialize_all(hw);
            assert_eq!(rhc_motor_rotate(hw, 1, 1), RHC_ERR_FAILED);
            assert_eq!(rhc_motor_set_pins(hw, 25, 24, 23, 22), RHC_OK);
            assert_eq!(rhc_motor_set_pins(hw, 25, 24, 23, 17), RHC_ERR_FAILED);
            assert_eq!(rhc_motor_set_to_output_mode(hw), RHC_OK);
            assert_eq!(rhc_motor_rotate(hw, 1, 1), RHC_OK);
            assert_eq!(rhc_motor_rotate(hw, 1, -1), RHC_OK);
            assert_eq!(rhc_motor_cleanup(hw), RHC_OK);
            rhc_hardware_free(hw);
        }
    }
}
