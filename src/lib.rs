// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The data-source layer of an authoritative DNS server.
//!
//! This crate stores and serves zone data and mediates every read and
//! write against it. The heart of it is the [`db`] module: a
//! [`DataSourceClient`](db::DataSourceClient) finds the zone that best
//! matches a query name and hands out finders, iterators and
//! transactional updaters for it, independently of the storage backend
//! in use. The [`name`], [`class`] and [`rr`] modules provide the
//! domain-name and resource-record types that the data source speaks
//! in.

pub mod class;
pub mod db;
pub mod name;
pub mod rr;
mod util;
