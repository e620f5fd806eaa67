//! Win32 implementation of the window seam: enumeration via `EnumWindows`,
//! pixel capture via a GDI blit from the window DC. Capture never activates
//! or repaints the target, so it is safe on non-foreground windows.

use anyhow::{bail, Result};
use chrono::Utc;
use image::{DynamicImage, RgbaImage};

use windows::Win32::Foundation::{HWND, LPARAM, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDIBits,
    GetWindowDC, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowLongW, GetWindowRect, GetWindowTextW, IsIconic, IsWindow,
    IsWindowVisible, GWL_EXSTYLE, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
};

use super::{CapturedFrame, WindowBounds, WindowId, WindowInfo, WindowService};

/// Windows smaller than this on either axis never render a legible prompt.
const MIN_CAPTURE_DIM: u32 = 100;

fn hwnd(id: WindowId) -> HWND {
    HWND(id as isize as *mut _)
}

pub struct Win32WindowService;

impl Win32WindowService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Win32WindowService {
    fn default() -> Self {
        Self::new()
    }
}

unsafe extern "system" fn enum_cb(handle: HWND, lparam: LPARAM) -> windows::Win32::Foundation::BOOL {
    let out = &mut *(lparam.0 as *mut Vec<WindowInfo>);
    if let Some(info) = read_window(handle) {
        out.push(info);
    }
    TRUE
}

unsafe fn read_window(handle: HWND) -> Option<WindowInfo> {
    let visible = IsWindowVisible(handle).as_bool();
    let minimized = IsIconic(handle).as_bool();
    if !visible && !minimized {
        return None;
    }

    let mut buf = [0u16; 512];
    let len = GetWindowTextW(handle, &mut buf);
    if len <= 0 {
        return None;
    }
    let title = String::from_utf16_lossy(&buf[..len as usize]);

    let mut class_buf = [0u16; 256];
    let class_len = GetClassNameW(handle, &mut class_buf);
    let class_name = if class_len > 0 {
        String::from_utf16_lossy(&class_buf[..class_len as usize])
    } else {
        String::new()
    };

    let mut rect = RECT::default();
    if GetWindowRect(handle, &mut rect).is_err() {
        return None;
    }

    let ex_style = GetWindowLongW(handle, GWL_EXSTYLE) as u32;

    Some(WindowInfo {
        id: handle.0 as isize as u64,
        title,
        class_name,
        bounds: WindowBounds {
            x: rect.left,
            y: rect.top,
            width: (rect.right - rect.left).max(0) as u32,
            height: (rect.bottom - rect.top).max(0) as u32,
        },
        visible,
        minimized,
        tool_window: ex_style & WS_EX_TOOLWINDOW.0 != 0,
        no_activate: ex_style & WS_EX_NOACTIVATE.0 != 0,
    })
}

impl WindowService for Win32WindowService {
    fn enumerate(&self) -> Vec<WindowInfo> {
        let mut windows: Vec<WindowInfo> = Vec::new();
        unsafe {
            // Enumeration failure leaves a partial (possibly empty) list,
            // which the scan loop tolerates.
            let _ = EnumWindows(
                Some(enum_cb),
                LPARAM(&mut windows as *mut Vec<WindowInfo> as isize),
            );
        }
        windows
    }

    fn capture(&self, id: WindowId) -> Result<Option<CapturedFrame>> {
        unsafe {
            let handle = hwnd(id);
            if !IsWindow(handle).as_bool() {
                return Ok(None);
            }
            let Some(info) = read_window(handle) else {
                return Ok(None);
            };
            if info.bounds.width < MIN_CAPTURE_DIM || info.bounds.height < MIN_CAPTURE_DIM {
                return Ok(None);
            }

            let image = blit_window(handle, info.bounds.width, info.bounds.height)?;
            Ok(Some(CapturedFrame {
                image,
                window: info,
                captured_at: Utc::now(),
            }))
        }
    }

    fn is_valid(&self, id: WindowId) -> bool {
        unsafe { IsWindow(hwnd(id)).as_bool() }
    }
}

unsafe fn blit_window(handle: HWND, width: u32, height: u32) -> Result<DynamicImage> {
    let window_dc = GetWindowDC(handle);
    if window_dc.is_invalid() {
        bail!("GetWindowDC failed");
    }

    let mem_dc = CreateCompatibleDC(window_dc);
    let bitmap = CreateCompatibleBitmap(window_dc, width as i32, height as i32);
    let old = SelectObject(mem_dc, bitmap);

    let blit = BitBlt(
        mem_dc,
        0,
        0,
        width as i32,
        height as i32,
        window_dc,
        0,
        0,
        SRCCOPY,
    );

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    let mut copied_rows = 0;
    if blit.is_ok() {
        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width as i32,
                // Negative height requests a top-down DIB.
                biHeight: -(height as i32),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        copied_rows = GetDIBits(
            mem_dc,
            bitmap,
            0,
            height,
            Some(pixels.as_mut_ptr() as *mut _),
            &mut info,
            DIB_RGB_COLORS,
        );
    }

    SelectObject(mem_dc, old);
    let _ = DeleteObject(bitmap);
    let _ = DeleteDC(mem_dc);
    ReleaseDC(handle, window_dc);

    if blit.is_err() || copied_rows == 0 {
        bail!("window blit failed");
    }

    // GDI hands back BGRA; swap to RGBA for the image crate.
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
        px[3] = 0xff;
    }

    let buffer = RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow::anyhow!("captured buffer size mismatch"))?;
    Ok(DynamicImage::ImageRgba8(buffer))
}
