//! Shared model types for tagless integration tests.
//!
//! This crate provides the object graphs exercised across the integration
//! tests: flat records, self-referential chains, mutually recursive types and
//! a few types the codec must refuse.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tagless::Describe;
use uuid::Uuid;

// ============================================================================
// Geometry
// ============================================================================

/// Two `i32` fields; the smallest interesting object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Describe)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

/// An object nested inline, without a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Describe)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

// ============================================================================
// Linked List
// ============================================================================

/// A singly linked list node referring to its own type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Describe)]
pub struct Node {
    pub name: String,
    pub next: Option<Box<Node>>,
}

impl Node {
    /// Builds a chain of `len` nodes named `n0`, `n1`, ... from the head.
    pub fn chain(len: usize) -> Self {
        assert!(len > 0, "a chain has at least one node");

        let mut node = Self { name: format!("n{}", len - 1), next: None };
        for index in (0..len - 1).rev() {
            node = Self {
                name: format!("n{index}"),
                next: Some(Box::new(node)),
            };
        }
        node
    }

    /// Returns the number of nodes reachable from `self`, itself included.
    pub fn node_count(&self) -> usize {
        let mut count = 1;
        let mut current = self;
        while let Some(next) = &current.next {
            count += 1;
            current = next;
        }
        count
    }
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Describe)]
#[repr(u8)]
pub enum Role {
    Guest,
    Member,
    Admin,
}

/// An enum without `#[repr]`, written as an `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Describe)]
pub enum Status {
    Active = 1,
    Suspended = -1,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Describe)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Describe)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
    pub height: f64,
    pub initial: char,
    pub verified: bool,
    pub joined: DateTime<Utc>,
    pub role: Role,
    pub status: Option<Status>,
    pub home: Option<Address>,
    pub previous: Vec<Address>,
    pub scores: Vec<i64>,
    pub tags: Vec<String>,
    pub nickname: Option<String>,
    pub manager: Option<Uuid>,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: String::new(),
            age: 0,
            height: 0.0,
            initial: '\0',
            verified: false,
            joined: DateTime::UNIX_EPOCH,
            role: Role::Guest,
            status: None,
            home: None,
            previous: Vec::new(),
            scores: Vec::new(),
            tags: Vec::new(),
            nickname: None,
            manager: None,
        }
    }
}

impl Person {
    /// A fully populated person.
    pub fn sample() -> Self {
        Self {
            id: Uuid::from_u128(0x6f1c_2f3a_9e0b_4c4d_8a8e_1b2c_3d4e_5f60),
            name: "Åsa Lindqvist".to_owned(),
            age: 41,
            height: 1.68,
            initial: 'Å',
            verified: true,
            joined: DateTime::from_timestamp(1_700_000_000, 250)
                .unwrap_or_default(),
            role: Role::Admin,
            status: Some(Status::Suspended),
            home: Some(Address {
                street: "Drottninggatan 1".to_owned(),
                city: "Stockholm".to_owned(),
                zip: Some("111 51".to_owned()),
            }),
            previous: vec![
                Address {
                    street: "Storgatan 7".to_owned(),
                    city: "Umeå".to_owned(),
                    zip: None,
                },
                Address::default(),
            ],
            scores: vec![i64::MIN, -1, 0, 1, i64::MAX],
            tags: vec!["ops".to_owned(), String::new(), "日本".to_owned()],
            nickname: None,
            manager: Some(Uuid::from_u128(7)),
        }
    }
}

// ============================================================================
// Organisation
// ============================================================================

/// Refers to [`Employee`], which refers back to `Team`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Describe)]
pub struct Team {
    pub name: String,
    pub members: Vec<Employee>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Describe)]
pub struct Employee {
    pub name: String,
    pub mentor_of: Option<Box<Team>>,
}

// ============================================================================
// Partially Described Types
// ============================================================================

/// Only `user` is part of the layout; `cached_len` is reset on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Describe)]
pub struct Session {
    pub user: String,
    cached_len: usize,
}

impl Session {
    pub fn new(user: &str) -> Self {
        Self { user: user.to_owned(), cached_len: user.len() }
    }

    pub fn cached_len(&self) -> usize { self.cached_len }
}

/// Declares a map field, which has no wire encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Describe)]
pub struct Inventory {
    pub owner: String,
    pub stock: HashMap<String, u32>,
}
