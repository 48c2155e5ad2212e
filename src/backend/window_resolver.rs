use std::collections::HashMap;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt};
use x11rb::rust_connection::RustConnection;

/// Best-effort pid -> window title lookup.
pub trait TitleSource: Send {
    fn titles(&self) -> HashMap<i32, String>;
}

/// No window system available.
pub struct NoTitles;

impl TitleSource for NoTitles {
    fn titles(&self) -> HashMap<i32, String> {
        HashMap::new()
    }
}

impl TitleSource for HashMap<i32, String> {
    fn titles(&self) -> HashMap<i32, String> {
        self.clone()
    }
}

/// Reads top-level window titles from an X11 (or XWayland) window manager
/// through `_NET_CLIENT_LIST`. Pure Wayland sessions expose no such list and
/// get no titles.
pub struct WindowResolver {
    x11: Option<(RustConnection, u32)>,
}

impl WindowResolver {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let root = conn.setup().roots[screen_num].root;
                log::info!("X11 connection established for window titles");
                Self {
                    x11: Some((conn, root)),
                }
            }
            Err(e) => {
                log::info!("X11 unavailable, window titles disabled: {}", e);
                Self { x11: None }
            }
        }
    }
}

impl Default for WindowResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleSource for WindowResolver {
    fn titles(&self) -> HashMap<i32, String> {
        match &self.x11 {
            Some((conn, root)) => collect_x11(conn, *root),
            None => HashMap::new(),
        }
    }
}

fn collect_x11(conn: &RustConnection, root: u32) -> HashMap<i32, String> {
    let mut map = HashMap::new();

    let Some(client_list) = intern_atom(conn, "_NET_CLIENT_LIST") else {
        return map;
    };
    let windows: Vec<u32> = match conn
        .get_property(false, root, client_list, AtomEnum::WINDOW, 0, 1024)
        .ok()
        .and_then(|cookie| cookie.reply().ok())
    {
        Some(reply) => reply.value32().map(|iter| iter.collect()).unwrap_or_default(),
        None => return map,
    };

    let atom_pid = intern_atom(conn, "_NET_WM_PID");
    let atom_name = intern_atom(conn, "_NET_WM_NAME");
    let atom_utf8 = intern_atom(conn, "UTF8_STRING");

    for win in windows {
        let pid = window_pid(conn, win, atom_pid);
        let title = window_title(conn, win, atom_name, atom_utf8);
        if let (Some(pid), Some(title)) = (pid, title) {
            let title = title.trim();
            // First window wins for multi-window processes.
            if !title.is_empty() {
                map.entry(pid as i32).or_insert_with(|| title.to_string());
            }
        }
    }

    map
}

fn intern_atom(conn: &RustConnection, name: &str) -> Option<u32> {
    conn.intern_atom(false, name.as_bytes())
        .ok()?
        .reply()
        .ok()
        .map(|r| r.atom)
}

fn window_pid(conn: &RustConnection, window: u32, atom_pid: Option<u32>) -> Option<u32> {
    let reply = conn
        .get_property(false, window, atom_pid?, AtomEnum::CARDINAL, 0, 1)
        .ok()?
        .reply()
        .ok()?;
    reply.value32().and_then(|mut iter| iter.next())
}

fn window_title(
    conn: &RustConnection,
    window: u32,
    atom_name: Option<u32>,
    atom_utf8: Option<u32>,
) -> Option<String> {
    // _NET_WM_NAME (UTF-8) first, then legacy WM_NAME
    if let (Some(name), Some(utf8)) = (atom_name, atom_utf8) {
        if let Some(reply) = conn
            .get_property(false, window, name, utf8, 0, 256)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
        {
            if reply.value_len > 0 {
                return Some(String::from_utf8_lossy(&reply.value).into_owned());
            }
        }
    }

    let reply = conn
        .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::STRING, 0, 256)
        .ok()?
        .reply()
        .ok()?;
    (reply.value_len > 0).then(|| String::from_utf8_lossy(&reply.value).into_owned())
}
