//! Lock/unlock tracking for buffers, surfaces, textures and volumes.
//!
//! A successful writable lock stores the mapped pointer and its extent in the wrapper's shadow
//! state. The matching unlock copies that region into its own record before the real call
//! releases the mapping, then clears the state.

use calltrace_api::native;
use calltrace_api::{Interface, Primitive, ResolvedCallable};
use calltrace_gen::{CallFrame, Injection, Snippet};
use calltrace_trace::ShadowField;

use super::DXT_FORMATS;

pub const LOCKED_PTR: &str = "locked_ptr";
pub const LOCKED_SIZE: &str = "locked_size";
pub const D3DLOCK_READONLY: u64 = 0x10;

const LOCK_METHODS: [&str; 3] = ["Lock", "LockRect", "LockBox"];

// Word offsets into the description structs.
const SURFACE_DESC_FORMAT: usize = 0;
const SURFACE_DESC_HEIGHT: usize = 7;
const VOLUME_DESC_DEPTH: usize = 6;
const BUFFER_DESC_SIZE: usize = 4;

#[repr(C)]
#[derive(Default)]
struct LockedRect {
    pitch: i32,
    bits: usize,
}

#[repr(C)]
#[derive(Default)]
struct LockedBox {
    _row_pitch: i32,
    slice_pitch: i32,
    bits: usize,
}

fn lockable(interface: &Interface) -> bool {
    LOCK_METHODS.iter().any(|m| interface.has_method(m))
}

pub(super) fn shadow_fields(interface: &Interface) -> Vec<ShadowField> {
    if lockable(interface) {
        vec![ShadowField::new(LOCKED_PTR, 0), ShadowField::new(LOCKED_SIZE, 0)]
    } else {
        Vec::new()
    }
}

pub(super) fn injection(interface: Option<&Interface>, callable: &ResolvedCallable) -> Injection {
    if !interface.is_some_and(lockable) {
        return Injection::none();
    }
    let post = match callable.name() {
        "Lock" => Snippet::new(
            "if SUCCEEDED(hr) && !(Flags & D3DLOCK_READONLY):\n\
             \x20   locked_ptr = *ppbData\n\
             \x20   locked_size = SizeToLock ? SizeToLock : GetDesc().Size - OffsetToLock",
            |frame| remember(frame, lock_buffer),
        ),
        "LockRect" => Snippet::new(
            "if SUCCEEDED(hr) && !(Flags & D3DLOCK_READONLY):\n\
             \x20   locked_ptr = pLockedRect->pBits\n\
             \x20   locked_size = pLockedRect->Pitch * rows(pRect or level desc)",
            |frame| remember(frame, lock_rect),
        ),
        "LockBox" => Snippet::new(
            "if SUCCEEDED(hr) && !(Flags & D3DLOCK_READONLY):\n\
             \x20   locked_ptr = pLockedVolume->pBits\n\
             \x20   locked_size = pLockedVolume->SlicePitch * depth(pBox or level desc)",
            |frame| remember(frame, lock_box),
        ),
        "Unlock" | "UnlockRect" | "UnlockBox" => {
            return Injection {
                pre: Some(Snippet::new(
                    "capture(locked_ptr, locked_size)\nlocked_ptr = locked_size = 0",
                    flush,
                )),
                post: None,
            };
        }
        _ => return Injection::none(),
    };
    Injection {
        pre: None,
        post: Some(post),
    }
}

/// Runs `region` after a lock call and stores its result, or clears the state when the lock
/// failed or was read-only.
fn remember(frame: &mut CallFrame<'_>, region: unsafe fn(&CallFrame<'_>) -> Option<(usize, u64)>) {
    let flags = frame.arg("Flags").unwrap_or(0);
    let (ptr, size) = if frame.succeeded() && flags & D3DLOCK_READONLY == 0 {
        // SAFETY: the lock succeeded, so its out-parameters were written by the implementation.
        unsafe { region(frame) }.unwrap_or((0, 0))
    } else {
        (0, 0)
    };
    tracing::trace!(method = frame.plan().name(), ptr, size, "lock region");
    frame.shadow_set(LOCKED_PTR, ptr as u64);
    frame.shadow_set(LOCKED_SIZE, size);
}

fn flush(frame: &mut CallFrame<'_>) {
    let ptr = frame.shadow_get(LOCKED_PTR).unwrap_or(0) as usize;
    let size = frame.shadow_get(LOCKED_SIZE).unwrap_or(0) as usize;
    // SAFETY: the region was mapped by the matching lock and is still mapped before the real
    // unlock runs.
    unsafe { frame.capture_memory(ptr, size) };
    frame.shadow_set(LOCKED_PTR, 0);
    frame.shadow_set(LOCKED_SIZE, 0);
}

/// Fetches a description struct through `GetLevelDesc(Level, ...)` when the lock names a level,
/// `GetDesc(...)` otherwise.
unsafe fn describe<const N: usize>(frame: &CallFrame<'_>) -> Option<[u32; N]> {
    let mut desc = [0u32; N];
    let out = desc.as_mut_ptr() as u64;
    let hr = match frame.arg("Level") {
        Some(level) => frame.call_method("GetLevelDesc", &[level, out])?,
        None => frame.call_method("GetDesc", &[out])?,
    };
    ((hr as u32 as i32) >= 0).then_some(desc)
}

unsafe fn lock_buffer(frame: &CallFrame<'_>) -> Option<(usize, u64)> {
    let data = native::read_pointer(frame.arg("ppbData")? as usize);
    let offset = frame.arg("OffsetToLock")? & 0xffff_ffff;
    let size = match frame.arg("SizeToLock")? & 0xffff_ffff {
        0 => {
            let desc = describe::<6>(frame)?;
            u64::from(desc[BUFFER_DESC_SIZE]).saturating_sub(offset)
        }
        size => size,
    };
    Some((data, size))
}

unsafe fn lock_rect(frame: &CallFrame<'_>) -> Option<(usize, u64)> {
    let out = frame.arg("pLockedRect")? as usize;
    let locked = (out as *const LockedRect).read_unaligned();
    let desc = describe::<8>(frame);
    let rows = match frame.arg("pRect").unwrap_or(0) as usize {
        0 => desc?[SURFACE_DESC_HEIGHT] as i64,
        rect => {
            let top = native::sign_extend(native::read_word(rect + 4, Primitive::I32), Primitive::I32);
            let bottom =
                native::sign_extend(native::read_word(rect + 12, Primitive::I32), Primitive::I32);
            bottom - top
        }
    };
    let compressed = desc.is_some_and(|d| DXT_FORMATS.contains(&d[SURFACE_DESC_FORMAT]));
    let rows = if compressed { (rows + 3) / 4 } else { rows };
    let size = i64::from(locked.pitch).max(0).saturating_mul(rows.max(0));
    Some((locked.bits, size as u64))
}

unsafe fn lock_box(frame: &CallFrame<'_>) -> Option<(usize, u64)> {
    let out = frame.arg("pLockedVolume")? as usize;
    let locked = (out as *const LockedBox).read_unaligned();
    let depth = match frame.arg("pBox").unwrap_or(0) as usize {
        0 => u64::from(describe::<7>(frame)?[VOLUME_DESC_DEPTH]),
        bx => {
            let front = native::read_word(bx + 16, Primitive::U32);
            let back = native::read_word(bx + 20, Primitive::U32);
            back.saturating_sub(front)
        }
    };
    let size = u64::try_from(locked.slice_pitch)
        .unwrap_or(0)
        .saturating_mul(depth);
    Some((locked.bits, size))
}
