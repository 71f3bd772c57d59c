//! Candidate items the simulator can place on its pad.

use crate::types::TagReading;

/// One library item that may be brought near the simulated reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolItem {
    pub id: &'static str,
    pub title: &'static str,
    pub rssi: i32,
    pub secured: bool,
}

impl PoolItem {
    /// Reading as the item would appear with its catalogue signal strength.
    pub fn to_reading(self) -> TagReading {
        TagReading::new(self.id)
            .with_data(format!("Book: {}", self.title))
            .with_rssi(self.rssi)
            .with_secured(self.secured)
    }
}

pub(crate) const ITEM_POOL: [PoolItem; 10] = [
    PoolItem {
        id: "RFID001",
        title: "The Great Gatsby",
        rssi: -45,
        secured: true,
    },
    PoolItem {
        id: "RFID002",
        title: "1984",
        rssi: -52,
        secured: false,
    },
    PoolItem {
        id: "RFID003",
        title: "Das gelbe Rechenbuch",
        rssi: -48,
        secured: true,
    },
    PoolItem {
        id: "RFID004",
        title: "To Kill a Mockingbird",
        rssi: -55,
        secured: true,
    },
    PoolItem {
        id: "RFID005",
        title: "Pride and Prejudice",
        rssi: -43,
        secured: true,
    },
    PoolItem {
        id: "RFID006",
        title: "The Catcher in the Rye",
        rssi: -50,
        secured: true,
    },
    PoolItem {
        id: "RFID007",
        title: "Harry Potter",
        rssi: -47,
        secured: false,
    },
    PoolItem {
        id: "RFID008",
        title: "The Hobbit",
        rssi: -58,
        secured: true,
    },
    PoolItem {
        id: "RFID009",
        title: "Brave New World",
        rssi: -46,
        secured: true,
    },
    PoolItem {
        id: "RFID010",
        title: "The Lord of the Rings",
        rssi: -51,
        secured: false,
    },
];

/// Look up a pool item by identifier.
pub(crate) fn find(id: &str) -> Option<PoolItem> {
    ITEM_POOL.iter().copied().find(|item| item.id == id)
}
