//! Windows clipboard backend
//!
//! A hidden message-only window registered with
//! `AddClipboardFormatListener`. The window, the listener and every
//! `OpenClipboard(hwnd)` call belong to the thread that created them, which
//! is why the whole session lives on the event source thread.
//!
//! Wakeups and teardown are thread messages (`PostThreadMessageW`), so the
//! waker only needs the owning thread id.

use std::io;
use std::ptr::{self, null_mut};
use std::thread;
use std::time::Duration;

use cs_core::{
    ClipboardError, ClipboardSession, ResourceLock, SessionFactory, SessionWaker, SourceMessage,
};
use winapi::shared::minwindef::{DWORD, FALSE, UINT};
use winapi::shared::windef::HWND;
use winapi::um::libloaderapi::GetModuleHandleW;
use winapi::um::processthreadsapi::GetCurrentThreadId;
use winapi::um::winbase::{GlobalAlloc, GlobalFree, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE};
use winapi::um::winuser::{
    AddClipboardFormatListener, CloseClipboard, CreateWindowExW, DestroyWindow, DispatchMessageW,
    EmptyClipboard, GetClipboardData, GetMessageW, OpenClipboard, PostThreadMessageW,
    RemoveClipboardFormatListener, SetClipboardData, TranslateMessage, CF_UNICODETEXT,
    HWND_MESSAGE, MSG, WM_APP, WM_CLIPBOARDUPDATE, WM_QUIT,
};

use crate::PlatformOptions;

/// Posted by [`WindowsWaker::wake`].
const WM_APP_WAKE: UINT = WM_APP + 1;

pub struct WindowsSessionFactory {
    window_class: String,
    open_attempts: u32,
    open_retry_delay: Duration,
}

impl WindowsSessionFactory {
    pub fn new(options: &PlatformOptions) -> Self {
        Self {
            window_class: options.window_class.clone(),
            open_attempts: options.open_attempts.max(1),
            open_retry_delay: options.open_retry_delay,
        }
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_os_error() -> String {
    io::Error::last_os_error().to_string()
}

impl SessionFactory for WindowsSessionFactory {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn attach(&self, _lock: &ResourceLock) -> Result<Box<dyn ClipboardSession>, ClipboardError> {
        let class = wide(&self.window_class);
        let title = wide("clipsignal");

        let hwnd = unsafe {
            CreateWindowExW(
                0,
                class.as_ptr(),
                title.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                null_mut(),
                GetModuleHandleW(ptr::null()),
                null_mut(),
            )
        };
        if hwnd.is_null() {
            return Err(ClipboardError::Registration(format!(
                "CreateWindowExW({}): {}",
                self.window_class,
                last_os_error()
            )));
        }

        if unsafe { AddClipboardFormatListener(hwnd) } == FALSE {
            let err = last_os_error();
            unsafe { DestroyWindow(hwnd) };
            return Err(ClipboardError::Registration(format!(
                "AddClipboardFormatListener: {err}"
            )));
        }

        let thread_id = unsafe { GetCurrentThreadId() };
        tracing::debug!(thread_id, class = %self.window_class, "clipboard listener window created");

        Ok(Box::new(WindowsSession {
            hwnd,
            thread_id,
            open_attempts: self.open_attempts,
            open_retry_delay: self.open_retry_delay,
        }))
    }
}

struct WindowsSession {
    hwnd: HWND,
    thread_id: DWORD,
    open_attempts: u32,
    open_retry_delay: Duration,
}

/// Closes the clipboard when dropped.
struct OpenedClipboard;

impl Drop for OpenedClipboard {
    fn drop(&mut self) {
        unsafe { CloseClipboard() };
    }
}

impl WindowsSession {
    /// `OpenClipboard` fails while another process holds the clipboard, so
    /// retry a few times before giving up.
    fn open(&self) -> Result<OpenedClipboard, ClipboardError> {
        let mut last_err = String::new();
        for attempt in 0..self.open_attempts {
            if unsafe { OpenClipboard(self.hwnd) } != FALSE {
                return Ok(OpenedClipboard);
            }
            last_err = last_os_error();
            if attempt + 1 < self.open_attempts {
                thread::sleep(self.open_retry_delay);
            }
        }
        Err(ClipboardError::Open(last_err))
    }
}

impl ClipboardSession for WindowsSession {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let _opened = self.open()?;

        let handle = unsafe { GetClipboardData(CF_UNICODETEXT) };
        if handle.is_null() {
            return Err(ClipboardError::NoText);
        }

        let data = unsafe { GlobalLock(handle) } as *const u16;
        if data.is_null() {
            return Err(ClipboardError::Read(format!("GlobalLock: {}", last_os_error())));
        }

        // Stop at the terminating NUL, never past the allocation.
        let capacity = unsafe { GlobalSize(handle) } / std::mem::size_of::<u16>();
        let units = unsafe { std::slice::from_raw_parts(data, capacity) };
        let len = units.iter().position(|&u| u == 0).unwrap_or(capacity);
        let text = String::from_utf16_lossy(&units[..len]);

        unsafe { GlobalUnlock(handle) };
        Ok(text)
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let _opened = self.open()?;

        if unsafe { EmptyClipboard() } == FALSE {
            return Err(ClipboardError::Write(format!("EmptyClipboard: {}", last_os_error())));
        }

        let units = wide(text);
        let bytes = units.len() * std::mem::size_of::<u16>();
        let handle = unsafe { GlobalAlloc(GMEM_MOVEABLE, bytes) };
        if handle.is_null() {
            return Err(ClipboardError::Write(format!("GlobalAlloc: {}", last_os_error())));
        }

        let dst = unsafe { GlobalLock(handle) } as *mut u16;
        if dst.is_null() {
            let err = last_os_error();
            unsafe { GlobalFree(handle) };
            return Err(ClipboardError::Write(format!("GlobalLock: {err}")));
        }
        unsafe {
            ptr::copy_nonoverlapping(units.as_ptr(), dst, units.len());
            GlobalUnlock(handle);
        }

        // On success the system owns the allocation.
        if unsafe { SetClipboardData(CF_UNICODETEXT, handle) }.is_null() {
            let err = last_os_error();
            unsafe { GlobalFree(handle) };
            return Err(ClipboardError::Write(format!("SetClipboardData: {err}")));
        }
        Ok(())
    }

    fn next_message(&mut self) -> Result<SourceMessage, ClipboardError> {
        loop {
            let mut msg: MSG = unsafe { std::mem::zeroed() };
            // A null window filter also retrieves thread messages such as
            // WM_QUIT and our wakeups.
            let ret = unsafe { GetMessageW(&mut msg, null_mut(), 0, 0) };
            if ret == 0 {
                return Ok(SourceMessage::Quit);
            }
            if ret == -1 {
                return Err(ClipboardError::MessageRetrieval(last_os_error()));
            }

            match msg.message {
                WM_APP_WAKE if msg.hwnd.is_null() => return Ok(SourceMessage::Wake),
                WM_CLIPBOARDUPDATE => {
                    unsafe {
                        TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                    return Ok(SourceMessage::ClipboardUpdate);
                }
                _ => unsafe {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                },
            }
        }
    }

    fn waker(&self) -> Box<dyn SessionWaker> {
        Box::new(WindowsWaker {
            thread_id: self.thread_id,
        })
    }
}

impl Drop for WindowsSession {
    fn drop(&mut self) {
        unsafe {
            RemoveClipboardFormatListener(self.hwnd);
            DestroyWindow(self.hwnd);
        }
        tracing::debug!("clipboard listener window destroyed");
    }
}

struct WindowsWaker {
    thread_id: DWORD,
}

impl WindowsWaker {
    fn post(&self, message: UINT) {
        if unsafe { PostThreadMessageW(self.thread_id, message, 0, 0) } == FALSE {
            tracing::warn!(
                thread_id = self.thread_id,
                message,
                error = %last_os_error(),
                "failed to post message to clipboard thread"
            );
        }
    }
}

impl SessionWaker for WindowsWaker {
    fn wake(&self) {
        self.post(WM_APP_WAKE);
    }

    fn shutdown(&self) {
        self.post(WM_QUIT);
    }
}
