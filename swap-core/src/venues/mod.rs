//! Venue client implementations and the per-venue binding.
//!
//! Each [`Venue`] variant gets exactly one client bound at construction;
//! the engine and router resolve clients through [`VenueClients`] and
//! never branch on venue names.

mod mock;
mod ompfinex;
mod wallex;

pub use mock::MockVenueClient;
pub use ompfinex::OmpfinexClient;
pub use wallex::WallexClient;

use std::collections::HashMap;
use std::sync::Arc;

use swap_common::markets::Venue;
use swap_common::venue::{VenueClient, VenueError};

/// The set of venue clients bound for this process.
#[derive(Default)]
pub struct VenueClients {
    clients: HashMap<Venue, Arc<dyn VenueClient>>,
}

impl VenueClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a client for its venue, replacing any previous binding.
    pub fn register(mut self, client: Arc<dyn VenueClient>) -> Self {
        self.clients.insert(client.venue(), client);
        self
    }

    /// The client bound for `venue`, if any.
    pub fn get(&self, venue: Venue) -> Option<Arc<dyn VenueClient>> {
        self.clients.get(&venue).cloned()
    }

    /// Iterate over all bound clients.
    pub fn iter(&self) -> impl Iterator<Item = (Venue, &Arc<dyn VenueClient>)> {
        self.clients.iter().map(|(v, c)| (*v, c))
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Map a transport-level failure onto the venue error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> VenueError {
    if err.is_timeout() {
        VenueError::Timeout(err.to_string())
    } else if err.is_connect() {
        VenueError::Connection(err.to_string())
    } else if err.is_decode() {
        VenueError::Parse(err.to_string())
    } else {
        VenueError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let clients = VenueClients::new()
            .register(Arc::new(MockVenueClient::new(Venue::Ompfinex)))
            .register(Arc::new(MockVenueClient::new(Venue::Wallex)));

        assert_eq!(clients.len(), 2);
        assert!(clients.get(Venue::Ompfinex).is_some());
        assert!(clients.get(Venue::Wallex).is_some());
    }

    #[test]
    fn test_rebinding_replaces() {
        let clients = VenueClients::new()
            .register(Arc::new(MockVenueClient::new(Venue::Wallex)))
            .register(Arc::new(MockVenueClient::new(Venue::Wallex)));
        assert_eq!(clients.len(), 1);
    }
}
