/*!
# Data Dashboard

A signed-in dashboard that pulls a dataset from an automation webhook, reshapes
whatever comes back into chartable records, and draws India vs. world
population as an interactive line or bar chart, built in Rust.

## Overview

Dataset webhooks answer in many shapes: arrays of objects, arrays of arrays,
bare numbers, objects wrapping a `data` array, CSV-ish text, or free text with
numbers in it. The normalizer turns all of them into one record format (a
`name` label plus numeric series values), the renderer draws those records on
a fixed 600×350 canvas, and the metric cards summarise the hovered (or latest)
record. Two more webhooks turn a prompt into an image and an uploaded image
into a description.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, plain JavaScript
- **Key Components**:
  - Dashboard page - Fetch button, chart type toggle, chart and metric cards
  - Hover handling - Pointer enter/leave on chart elements re-renders the chart
  - Image tools - Prompt-to-image and image-to-description forms

### Backend Layer
- **Technologies**: Rust, axum, tokio
- **Core Components**:
  - Shape Normalizer - Ordered recognizers over the payload shape, total and depth-bounded
  - Chart Renderer - Pure geometry plus SVG output, hover derived per draw
  - Metric Cards - Population formatting and share of world
  - Raster export - PNG rendering through plotters
  - Webhook client - reqwest calls to the dataset, image and description webhooks
  - Auth - Argon2 accounts, cookie sessions, request guards

### Data Persistence Layer
- `users.json` for accounts and `profiles.json` for profiles, both under `DATABASE_DIR`

## Modules

- **record**: Normalized record type and numeric coercion helpers
- **normalizer**: Payload shape recognition and reshaping into records
- **graph**: Chart geometry, hover state and SVG rendering
- **metrics**: Metric card values and formatting
- **profile**: Profile type and repository implementations
- **config**: Environment configuration
- **auth**: Accounts, sessions and auth handlers
- **webhooks**: Client for the external automation webhooks
- **export**: PNG export and example chart generation
- **app**: Routing and handlers

## REST API Endpoints

- `/api/profile/create` - Returns the caller's profile, creating it on first use
- `/api/profile` - Reads, updates or deletes the caller's profile
- `/api/dataset` - Pulls and normalizes the dataset, returns the first chart
- `/api/chart`, `/api/chart.png` - Re-renders records for a chart type and hover
- `/api/normalize` - Normalizes an arbitrary body
- `/api/generate-image`, `/api/describe-image` - Image webhook proxies
*/

pub mod config;
pub mod graph;
pub mod metrics;
pub mod normalizer;
pub mod profile;
pub mod record;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod auth;
#[cfg(feature = "web")]
pub mod export;
#[cfg(feature = "web")]
pub mod webhooks;

pub use config::Config;
pub use graph::{Chart, ChartType, HoverState};
pub use metrics::{MetricCards, metric_cards};
pub use normalizer::{normalize, normalize_payload, normalize_text};
pub use profile::{JsonProfileStore, MemoryProfileStore, Profile, ProfileRepository};
pub use record::Record;
