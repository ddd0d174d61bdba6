//! EGL 1.4 entry points plus the image extension.
//!
//! Every entry point is traced, including the extension functions an application only reaches
//! through `eglGetProcAddress`, which hands out the generated shim instead of the driver's
//! pointer whenever one exists. `eglMakeCurrent` also refreshes the current [`Profile`].

mod profile;

use std::sync::Arc;

use calltrace_api::{native, ApiBuilder, Callable, EnumDef, Primitive, Type};
use calltrace_gen::{ArgEncoding, CallFrame, Hooks, Injection, Snippet};
use calltrace_trace::Value;

pub use profile::{Profile, ProfileTracker};

pub const EGL_NONE: u32 = 0x3038;
pub const EGL_CONTEXT_CLIENT_TYPE: u32 = 0x3097;
pub const EGL_CONTEXT_CLIENT_VERSION: u32 = 0x3098;
pub const EGL_OPENGL_ES_API: u32 = 0x30A0;
pub const EGL_OPENGL_API: u32 = 0x30A2;

/// Attribute lists longer than this are cut short in the trace.
const MAX_ATTRIBS: usize = 256;

const ATTRIBUTES: &[(&str, i64)] = &[
    ("EGL_BUFFER_SIZE", 0x3020),
    ("EGL_ALPHA_SIZE", 0x3021),
    ("EGL_BLUE_SIZE", 0x3022),
    ("EGL_GREEN_SIZE", 0x3023),
    ("EGL_RED_SIZE", 0x3024),
    ("EGL_DEPTH_SIZE", 0x3025),
    ("EGL_STENCIL_SIZE", 0x3026),
    ("EGL_CONFIG_CAVEAT", 0x3027),
    ("EGL_CONFIG_ID", 0x3028),
    ("EGL_LEVEL", 0x3029),
    ("EGL_MAX_PBUFFER_HEIGHT", 0x302A),
    ("EGL_MAX_PBUFFER_PIXELS", 0x302B),
    ("EGL_MAX_PBUFFER_WIDTH", 0x302C),
    ("EGL_NATIVE_RENDERABLE", 0x302D),
    ("EGL_NATIVE_VISUAL_ID", 0x302E),
    ("EGL_NATIVE_VISUAL_TYPE", 0x302F),
    ("EGL_SAMPLES", 0x3031),
    ("EGL_SAMPLE_BUFFERS", 0x3032),
    ("EGL_SURFACE_TYPE", 0x3033),
    ("EGL_TRANSPARENT_TYPE", 0x3034),
    ("EGL_TRANSPARENT_BLUE_VALUE", 0x3035),
    ("EGL_TRANSPARENT_GREEN_VALUE", 0x3036),
    ("EGL_TRANSPARENT_RED_VALUE", 0x3037),
    ("EGL_NONE", EGL_NONE as i64),
    ("EGL_BIND_TO_TEXTURE_RGB", 0x3039),
    ("EGL_BIND_TO_TEXTURE_RGBA", 0x303A),
    ("EGL_MIN_SWAP_INTERVAL", 0x303B),
    ("EGL_MAX_SWAP_INTERVAL", 0x303C),
    ("EGL_LUMINANCE_SIZE", 0x303D),
    ("EGL_ALPHA_MASK_SIZE", 0x303E),
    ("EGL_COLOR_BUFFER_TYPE", 0x303F),
    ("EGL_RENDERABLE_TYPE", 0x3040),
    ("EGL_MATCH_NATIVE_PIXMAP", 0x3041),
    ("EGL_CONFORMANT", 0x3042),
    ("EGL_VENDOR", 0x3053),
    ("EGL_VERSION", 0x3054),
    ("EGL_EXTENSIONS", 0x3055),
    ("EGL_HEIGHT", 0x3056),
    ("EGL_WIDTH", 0x3057),
    ("EGL_LARGEST_PBUFFER", 0x3058),
    ("EGL_DRAW", 0x3059),
    ("EGL_READ", 0x305A),
    ("EGL_CORE_NATIVE_ENGINE", 0x305B),
    ("EGL_TEXTURE_FORMAT", 0x3080),
    ("EGL_TEXTURE_TARGET", 0x3081),
    ("EGL_MIPMAP_TEXTURE", 0x3082),
    ("EGL_MIPMAP_LEVEL", 0x3083),
    ("EGL_BACK_BUFFER", 0x3084),
    ("EGL_SINGLE_BUFFER", 0x3085),
    ("EGL_RENDER_BUFFER", 0x3086),
    ("EGL_COLORSPACE", 0x3087),
    ("EGL_ALPHA_FORMAT", 0x3088),
    ("EGL_CLIENT_APIS", 0x308D),
    ("EGL_RGB_BUFFER", 0x308E),
    ("EGL_LUMINANCE_BUFFER", 0x308F),
    ("EGL_SWAP_BEHAVIOR", 0x3093),
    ("EGL_CONTEXT_CLIENT_TYPE", EGL_CONTEXT_CLIENT_TYPE as i64),
    ("EGL_CONTEXT_CLIENT_VERSION", EGL_CONTEXT_CLIENT_VERSION as i64),
    ("EGL_OPENGL_ES_API", EGL_OPENGL_ES_API as i64),
    ("EGL_OPENVG_API", 0x30A1),
    ("EGL_OPENGL_API", EGL_OPENGL_API as i64),
    ("EGL_GL_TEXTURE_2D_KHR", 0x30B1),
    ("EGL_GL_TEXTURE_LEVEL_KHR", 0x30BC),
    ("EGL_IMAGE_PRESERVED_KHR", 0x30D2),
];

const ERRORS: &[&str] = &[
    "EGL_SUCCESS",
    "EGL_NOT_INITIALIZED",
    "EGL_BAD_ACCESS",
    "EGL_BAD_ALLOC",
    "EGL_BAD_ATTRIBUTE",
    "EGL_BAD_CONFIG",
    "EGL_BAD_CONTEXT",
    "EGL_BAD_CURRENT_SURFACE",
    "EGL_BAD_DISPLAY",
    "EGL_BAD_MATCH",
    "EGL_BAD_NATIVE_PIXMAP",
    "EGL_BAD_NATIVE_WINDOW",
    "EGL_BAD_PARAMETER",
    "EGL_BAD_SURFACE",
    "EGL_CONTEXT_LOST",
];

fn handle(name: &str) -> Type {
    Type::alias(name, Type::opaque_ptr())
}

fn display() -> Type {
    handle("EGLDisplay")
}

fn config() -> Type {
    handle("EGLConfig")
}

fn surface() -> Type {
    handle("EGLSurface")
}

fn context() -> Type {
    handle("EGLContext")
}

fn egl_int() -> Type {
    Type::alias("EGLint", Type::prim(Primitive::I32))
}

fn boolean() -> Type {
    Type::alias("EGLBoolean", Type::prim(Primitive::U32))
}

fn egl_enum() -> Type {
    Type::enumeration("EGLenum")
}

/// `const EGLint *attrib_list`: name/value pairs ending with `EGL_NONE`.
fn attrib_list() -> Type {
    Type::alias("EGLAttribList", Type::const_ptr(egl_int()))
}

fn is_attrib_list(ty: &Type) -> bool {
    matches!(ty, Type::Alias { name, .. } if name == "EGLAttribList")
}

fn attribute_name(value: i64) -> Option<&'static str> {
    ATTRIBUTES.iter().find(|(_, v)| *v == value).map(|(n, _)| *n)
}

/// Reads an attribute list as a flat `[name, value, ..., EGL_NONE]` array.
///
/// # Safety
///
/// `addr` must be null or point to an `EGL_NONE` terminated list of `EGLint` pairs.
unsafe fn attrib_list_value(addr: u64) -> Value {
    if addr == 0 {
        return Value::Null;
    }
    let read = |index: usize| {
        let word = native::read_word(addr as usize + index * 4, Primitive::I32);
        native::sign_extend(word, Primitive::I32)
    };
    let mut items = Vec::new();
    for pair in 0..MAX_ATTRIBS {
        let attribute = read(pair * 2);
        items.push(Value::Enum {
            name: attribute_name(attribute).map(str::to_owned),
            value: attribute,
        });
        if attribute == EGL_NONE as i64 {
            return Value::Array(items);
        }
        items.push(Value::SInt(read(pair * 2 + 1)));
    }
    tracing::warn!(max = MAX_ATTRIBS, "EGL attribute list is not terminated, truncating");
    Value::Array(items)
}

fn f(ret: Type, name: &str) -> Callable {
    Callable::new(ret, name)
}

fn functions(b: &mut ApiBuilder) {
    let native_display = || handle("EGLNativeDisplayType");
    let native_window = || handle("EGLNativeWindowType");
    let native_pixmap = || handle("EGLNativePixmapType");
    let client_buffer = || handle("EGLClientBuffer");
    let image = || handle("EGLImageKHR");

    b.functions(vec![
        f(Type::enumeration("EGLError"), "eglGetError").no_side_effects(),
        f(display(), "eglGetDisplay")
            .arg(native_display(), "display_id")
            .fail(0),
        f(boolean(), "eglInitialize")
            .arg(display(), "dpy")
            .out(Type::ptr(egl_int()), "major")
            .out(Type::ptr(egl_int()), "minor")
            .fail(0),
        f(boolean(), "eglTerminate").arg(display(), "dpy").fail(0),
        f(Type::string(), "eglQueryString")
            .arg(display(), "dpy")
            .arg(egl_enum(), "name")
            .fail(0)
            .no_side_effects(),
        f(boolean(), "eglGetConfigs")
            .arg(display(), "dpy")
            .out(Type::array(config(), "*num_config"), "configs")
            .arg(egl_int(), "config_size")
            .out(Type::ptr(egl_int()), "num_config")
            .fail(0)
            .no_side_effects(),
        f(boolean(), "eglChooseConfig")
            .arg(display(), "dpy")
            .arg(attrib_list(), "attrib_list")
            .out(Type::array(config(), "*num_config"), "configs")
            .arg(egl_int(), "config_size")
            .out(Type::ptr(egl_int()), "num_config")
            .fail(0)
            .no_side_effects(),
        f(boolean(), "eglGetConfigAttrib")
            .arg(display(), "dpy")
            .arg(config(), "config")
            .arg(egl_enum(), "attribute")
            .out(Type::ptr(egl_int()), "value")
            .fail(0)
            .no_side_effects(),
        f(surface(), "eglCreateWindowSurface")
            .arg(display(), "dpy")
            .arg(config(), "config")
            .arg(native_window(), "win")
            .arg(attrib_list(), "attrib_list")
            .fail(0),
        f(surface(), "eglCreatePbufferSurface")
            .arg(display(), "dpy")
            .arg(config(), "config")
            .arg(attrib_list(), "attrib_list")
            .fail(0),
        f(surface(), "eglCreatePixmapSurface")
            .arg(display(), "dpy")
            .arg(config(), "config")
            .arg(native_pixmap(), "pixmap")
            .arg(attrib_list(), "attrib_list")
            .fail(0),
        f(boolean(), "eglDestroySurface")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .fail(0),
        f(boolean(), "eglQuerySurface")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .arg(egl_enum(), "attribute")
            .out(Type::ptr(egl_int()), "value")
            .fail(0)
            .no_side_effects(),
        f(boolean(), "eglBindAPI").arg(egl_enum(), "api").fail(0),
        f(egl_enum(), "eglQueryAPI").no_side_effects(),
        f(boolean(), "eglWaitClient").fail(0),
        f(boolean(), "eglReleaseThread").fail(0),
        f(surface(), "eglCreatePbufferFromClientBuffer")
            .arg(display(), "dpy")
            .arg(egl_enum(), "buftype")
            .arg(client_buffer(), "buffer")
            .arg(config(), "config")
            .arg(attrib_list(), "attrib_list")
            .fail(0),
        f(boolean(), "eglSurfaceAttrib")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .arg(egl_enum(), "attribute")
            .arg(egl_int(), "value")
            .fail(0),
        f(boolean(), "eglBindTexImage")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .arg(egl_enum(), "buffer")
            .fail(0),
        f(boolean(), "eglReleaseTexImage")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .arg(egl_enum(), "buffer")
            .fail(0),
        f(boolean(), "eglSwapInterval")
            .arg(display(), "dpy")
            .arg(egl_int(), "interval")
            .fail(0),
        f(context(), "eglCreateContext")
            .arg(display(), "dpy")
            .arg(config(), "config")
            .arg(context(), "share_context")
            .arg(attrib_list(), "attrib_list")
            .fail(0),
        f(boolean(), "eglDestroyContext")
            .arg(display(), "dpy")
            .arg(context(), "ctx")
            .fail(0),
        f(boolean(), "eglMakeCurrent")
            .arg(display(), "dpy")
            .arg(surface(), "draw")
            .arg(surface(), "read")
            .arg(context(), "ctx")
            .fail(0),
        f(context(), "eglGetCurrentContext").no_side_effects(),
        f(surface(), "eglGetCurrentSurface")
            .arg(egl_enum(), "readdraw")
            .no_side_effects(),
        f(display(), "eglGetCurrentDisplay").no_side_effects(),
        f(boolean(), "eglQueryContext")
            .arg(display(), "dpy")
            .arg(context(), "ctx")
            .arg(egl_enum(), "attribute")
            .out(Type::ptr(egl_int()), "value")
            .fail(0)
            .no_side_effects(),
        f(boolean(), "eglWaitGL").fail(0),
        f(boolean(), "eglWaitNative").arg(egl_enum(), "engine").fail(0),
        f(boolean(), "eglSwapBuffers")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .fail(0),
        f(boolean(), "eglCopyBuffers")
            .arg(display(), "dpy")
            .arg(surface(), "surface")
            .arg(native_pixmap(), "target")
            .fail(0),
        f(Type::opaque_ptr(), "eglGetProcAddress")
            .arg(Type::string(), "procname")
            .fail(0)
            .no_side_effects(),
        f(image(), "eglCreateImageKHR")
            .arg(display(), "dpy")
            .arg(context(), "ctx")
            .arg(egl_enum(), "target")
            .arg(client_buffer(), "buffer")
            .arg(attrib_list(), "attrib_list")
            .fail(0)
            .internal(),
        f(boolean(), "eglDestroyImageKHR")
            .arg(display(), "dpy")
            .arg(image(), "image")
            .fail(0)
            .internal(),
    ]);
}

pub fn builder() -> ApiBuilder {
    let mut b = ApiBuilder::new("egl");
    b.enumeration(EnumDef::with_values("EGLenum", Primitive::U32, ATTRIBUTES));
    let mut errors = EnumDef::new("EGLError", Primitive::I32);
    errors.push(ERRORS[0], Some(0x3000));
    for name in &ERRORS[1..] {
        errors.push(name, None);
    }
    b.enumeration(errors);
    b.constant("EGL_NONE", u64::from(EGL_NONE))
        .constant("EGL_FALSE", 0)
        .constant("EGL_TRUE", 1);
    functions(&mut b);
    b
}

/// Queries one integer attribute of `ctx` from the real implementation.
fn query_context(frame: &CallFrame<'_>, dpy: u64, ctx: u64, attribute: u32) -> Option<i32> {
    let mut value: i32 = 0;
    let out = &mut value as *mut i32 as u64;
    // SAFETY: eglQueryContext(EGLDisplay, EGLContext, EGLint, EGLint *) and `out` outlives
    // the call.
    let ok = unsafe { frame.call_function("eglQueryContext", &[dpy, ctx, attribute as u64, out]) }?;
    (ok as u32 != 0).then_some(value)
}

fn update_profile(frame: &mut CallFrame<'_>, tracker: &ProfileTracker) {
    let ctx = frame.arg("ctx").unwrap_or(0);
    if ctx == 0 || frame.result().unwrap_or(0) as u32 == 0 {
        return;
    }
    let dpy = frame.arg("dpy").unwrap_or(0);
    let client_type = query_context(frame, dpy, ctx, EGL_CONTEXT_CLIENT_TYPE)
        .map_or(EGL_OPENGL_ES_API, |v| v as u32);
    let client_version = query_context(frame, dpy, ctx, EGL_CONTEXT_CLIENT_VERSION).unwrap_or(1);
    match Profile::from_context(client_type, client_version) {
        Some(profile) => {
            tracing::debug!(?profile, "current EGL context changed");
            tracker.set(profile);
        }
        None => tracing::warn!(client_type, "unknown EGL client API"),
    }
}

/// Swaps the driver's pointer for the shim of the same name, so calls made through it are
/// traced too. Names without a shim keep the real pointer.
fn redirect_proc_address(frame: &mut CallFrame<'_>) {
    let procname = frame.arg("procname").unwrap_or(0);
    if procname == 0 || frame.result().unwrap_or(0) == 0 {
        return;
    }
    // SAFETY: `procname` is the NUL-terminated name the application passed to EGL.
    let name = unsafe { native::read_cstr(procname as usize) };
    if let Some(shim) = frame.shim_address(&name) {
        tracing::debug!(%name, "eglGetProcAddress answered with the traced entry point");
        frame.set_result(shim as u64);
    }
}

/// Full visibility, attribute lists and profile tracking into `profile`.
pub fn hooks(profile: Arc<ProfileTracker>) -> Hooks {
    Hooks::new()
        .with_visibility(|_| true)
        .with_serialize_arg(|ctx| {
            if is_attrib_list(&ctx.param.param.ty) {
                // SAFETY: encoders only see attribute-list words the application handed to EGL.
                ArgEncoding::custom("EGLint attrib_list", |word| unsafe {
                    attrib_list_value(word)
                })
            } else {
                ArgEncoding::Default
            }
        })
        .with_inject(move |_, callable| match callable.name() {
            "eglMakeCurrent" => {
                let tracker = Arc::clone(&profile);
                Injection {
                    pre: None,
                    post: Some(Snippet::new(
                        "if ctx != EGL_NO_CONTEXT && result:\n\
                         \x20   profile = profile_of(eglQueryContext(dpy, ctx, EGL_CONTEXT_CLIENT_TYPE),\n\
                         \x20                        eglQueryContext(dpy, ctx, EGL_CONTEXT_CLIENT_VERSION))",
                        move |frame| update_profile(frame, &tracker),
                    )),
                }
            }
            "eglGetProcAddress" => Injection {
                pre: None,
                post: Some(Snippet::new(
                    "if result and shim_of(procname):\n\
                     \x20   result = shim_of(procname)",
                    redirect_proc_address,
                )),
            },
            _ => Injection::none(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_list_stops_at_none() {
        let list: [i32; 5] = [0x3024, 8, 0x3098, 2, EGL_NONE as i32];
        let value = unsafe { attrib_list_value(list.as_ptr() as u64) };
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(
            items[0],
            Value::Enum {
                name: Some("EGL_RED_SIZE".to_owned()),
                value: 0x3024
            }
        );
        assert_eq!(items[3], Value::SInt(2));
        assert_eq!(unsafe { attrib_list_value(0) }, Value::Null);
    }
}
