use std::io::Write;

const OSC_START: &str = "\x1b]777;";
const OSC_END: &str = "\x1b\\";

pub fn container_push_sequence(container: &str, uid: u32) -> String {
    format!("{OSC_START}container;push;{container};toolbox;{uid}{OSC_END}")
}

pub fn container_pop_sequence(uid: u32) -> String {
    format!("{OSC_START}container;pop;;;{uid}{OSC_END}")
}

/// Brackets a session with container push/pop escape sequences.
///
/// The push is written on construction, the pop when the guard is dropped,
/// so every exit path emits it. Write errors are ignored.
pub struct ContainerContextGuard<W: Write> {
    out: W,
    uid: u32,
    active: bool,
}

impl<W: Write> ContainerContextGuard<W> {
    pub fn push(mut out: W, enabled: bool, container: &str, uid: u32) -> Self {
        if enabled {
            let _ = out.write_all(container_push_sequence(container, uid).as_bytes());
            let _ = out.flush();
        }
        Self {
            out,
            uid,
            active: enabled,
        }
    }
}

impl<W: Write> Drop for ContainerContextGuard<W> {
    fn drop(&mut self) {
        if self.active {
            let _ = self
                .out
                .write_all(container_pop_sequence(self.uid).as_bytes());
            let _ = self.out.flush();
        }
    }
}
