//! Client registry
//!
//! Managed clients keyed by client window, plus a reverse index from every
//! frame and decoration window to the client that owns it.

use anyhow::{Result, bail};
use std::collections::HashMap;
use x11rb::protocol::xproto::Window;

use crate::wm::client::Client;
use crate::wm::decorations::FramePart;

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<Window, Client>,
    /// Frame/decoration window -> client window
    owners: HashMap<Window, Window>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framed client. Fails if the client is already managed.
    pub fn insert(&mut self, client: Client) -> Result<()> {
        if self.clients.contains_key(&client.id) {
            bail!("window 0x{:x} is already managed", client.id);
        }
        for window in client.frame.windows() {
            self.owners.insert(window, client.id);
        }
        self.clients.insert(client.id, client);
        Ok(())
    }

    pub fn remove(&mut self, id: Window) -> Option<Client> {
        let client = self.clients.remove(&id)?;
        for window in client.frame.windows() {
            self.owners.remove(&window);
        }
        Some(client)
    }

    #[cfg(test)]
    pub fn get(&self, id: Window) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: Window) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn contains(&self, id: Window) -> bool {
        self.clients.contains_key(&id)
    }

    /// Which client a frame or decoration window belongs to, and which part it is
    pub fn find_by_window(&self, window: Window) -> Option<(Window, FramePart)> {
        let id = *self.owners.get(&window)?;
        let part = self.clients.get(&id)?.frame.part_of(window)?;
        Some((id, part))
    }

    /// Client owning `window`, which may be the client itself or any of its
    /// frame windows
    pub fn client_for(&self, window: Window) -> Option<Window> {
        if self.clients.contains_key(&window) {
            Some(window)
        } else {
            self.owners.get(&window).copied()
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::decorations::WindowFrame;

    fn client(id: Window, base: Window) -> Client {
        let frame = WindowFrame {
            client: id,
            frame: base,
            titlebar: base + 1,
            close_button: base + 2,
            zoom_button: base + 3,
            resize_handle: base + 4,
        };
        Client::new(frame, Geometry::new(0, 0, 304, 226), String::new())
    }

    #[test]
    fn lookups_by_any_window() {
        let mut registry = ClientRegistry::new();
        registry.insert(client(0x42, 0x1000)).unwrap();

        assert_eq!(registry.find_by_window(0x1000), Some((0x42, FramePart::Frame)));
        assert_eq!(registry.find_by_window(0x1003), Some((0x42, FramePart::Zoom)));
        assert_eq!(registry.find_by_window(0x42), None);
        assert_eq!(registry.client_for(0x42), Some(0x42));
        assert_eq!(registry.client_for(0x1004), Some(0x42));
        assert_eq!(registry.client_for(0x9999), None);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut registry = ClientRegistry::new();
        registry.insert(client(0x42, 0x1000)).unwrap();
        assert!(registry.insert(client(0x42, 0x2000)).is_err());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_window(0x2000), None);
    }

    #[test]
    fn remove_drops_reverse_index() {
        let mut registry = ClientRegistry::new();
        registry.insert(client(0x42, 0x1000)).unwrap();
        registry.insert(client(0x43, 0x2000)).unwrap();

        let removed = registry.remove(0x42).unwrap();
        assert_eq!(removed.frame.frame, 0x1000);
        assert!(!registry.contains(0x42));
        assert_eq!(registry.find_by_window(0x1001), None);
        assert_eq!(registry.client_for(0x2001), Some(0x43));
        assert!(registry.remove(0x42).is_none());
    }
}
