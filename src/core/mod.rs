//! Rendering-engine core: scalar/math helpers, geometry, and the spectral
//! representation. Mirrors the teacher's `core` grab-bag module, narrowed to
//! what this renderer actually needs (no BSSRDF, participating media, film
//! filters, or generic texture/primitive machinery — all non-goals here).

pub mod geometry;
pub mod pbrt;
pub mod spectrum;
