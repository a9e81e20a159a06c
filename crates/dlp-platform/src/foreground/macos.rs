//! macOS frontmost-application lookup via NSWorkspace.

use std::ffi::CStr;
use std::os::raw::c_char;

use cocoa::base::{id, nil};
use objc::{class, msg_send, sel, sel_impl};

pub(crate) fn frontmost_app_name() -> Option<String> {
    unsafe {
        let pool: id = msg_send![class!(NSAutoreleasePool), new];
        let name = frontmost_app_name_inner();
        let _: () = msg_send![pool, drain];
        name
    }
}

unsafe fn frontmost_app_name_inner() -> Option<String> {
    let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
    if workspace == nil {
        return None;
    }
    let app: id = msg_send![workspace, frontmostApplication];
    if app == nil {
        return None;
    }
    let name: id = msg_send![app, localizedName];
    nsstring_to_string(name)
}

unsafe fn nsstring_to_string(s: id) -> Option<String> {
    if s == nil {
        return None;
    }
    let utf8: *const c_char = msg_send![s, UTF8String];
    if utf8.is_null() {
        return None;
    }
    Some(CStr::from_ptr(utf8).to_string_lossy().into_owned())
}
