//! # Repository Module
//!
//! Database repository implementations for Boteco POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  HTTP Handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().get_by_id(&id)                                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── insert(&self, sale)                                               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── save(&self, sale)          ← optimistic concurrency               │
//! │  └── list_finalizadas(...)                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Easy to exercise against an in-memory database in tests             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD
//! - [`customer::CustomerRepository`] - Customer registration
//! - [`employee::EmployeeRepository`] - Employee registration
//! - [`group::GroupRepository`] - Product groups and units of measure
//! - [`mesa::MesaRepository`] - Mesa registration and base status
//! - [`sale::SaleRepository`] - The sale aggregate, with version CAS

pub mod customer;
pub mod employee;
pub mod group;
pub mod mesa;
pub mod product;
pub mod sale;
