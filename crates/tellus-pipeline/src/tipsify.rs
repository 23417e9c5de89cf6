//! Vertex-cache-aware triangle reordering (Tipsify) and the ACMR metric.
//!
//! Tipsify (Sander, Nehab, Barczak) reorders a triangle index stream so
//! consecutive triangles reuse recently shaded vertices, reducing GPU
//! vertex-shader invocations. ACMR — average cache miss ratio, misses per
//! triangle under a simulated FIFO cache — measures how well an order does.

use crate::error::PipelineError;

/// Post-transform cache size assumed when none is given.
pub const DEFAULT_CACHE_SIZE: usize = 24;

fn validate(
    indices: &[u32],
    maximum_index: u32,
    cache_size: usize,
) -> Result<(), PipelineError> {
    if indices.is_empty() || indices.len() % 3 != 0 {
        return Err(PipelineError::InvalidIndexCount {
            len: indices.len(),
        });
    }
    if cache_size < 3 {
        return Err(PipelineError::InvalidCacheSize { cache_size });
    }
    debug_assert!(indices.iter().all(|&i| i <= maximum_index));
    Ok(())
}

fn resolve_maximum_index(indices: &[u32], maximum_index: Option<u32>) -> u32 {
    maximum_index.unwrap_or_else(|| indices.iter().copied().max().unwrap_or(0))
}

/// Average cache miss ratio of a triangle index stream under a FIFO
/// post-transform cache of `cache_size` entries.
///
/// A vertex hits while one of the last `cache_size` cache insertions; a
/// hit does not refresh its slot (FIFO, not LRU). Lower is better; 3.0 is
/// the no-reuse worst case and 0.5 the theoretical floor for a regular
/// grid.
pub fn calculate_acmr(
    indices: &[u32],
    maximum_index: Option<u32>,
    cache_size: usize,
) -> Result<f64, PipelineError> {
    let maximum_index = resolve_maximum_index(indices, maximum_index);
    validate(indices, maximum_index, cache_size)?;

    // Time advances only on cache insertion; a vertex is cached while its
    // insertion time is within `cache_size` of the present.
    let mut last_inserted = vec![i64::MIN / 2; maximum_index as usize + 1];
    let mut time = cache_size as i64 + 1;
    let mut misses = 0usize;

    for &index in indices {
        if time - last_inserted[index as usize] > cache_size as i64 {
            misses += 1;
            last_inserted[index as usize] = time;
            time += 1;
        }
    }

    Ok(misses as f64 / (indices.len() / 3) as f64)
}

/// Per-vertex bookkeeping for the Tipsify traversal.
struct Vertex {
    /// Triangles containing this vertex that are not yet emitted.
    live_triangles: u32,
    /// Simulated cache insertion time.
    time_stamp: i64,
    /// Ids of all triangles containing this vertex.
    triangles: Vec<u32>,
}

/// Reorders a triangle index stream for better vertex-cache locality.
///
/// Fans out from a cursor vertex, emitting all its unemitted triangles,
/// then picks the next cursor among the just-touched one-ring by a
/// priority that favors vertices still in the simulated cache with few
/// remaining triangles. When the ring is exhausted it pops the dead-end
/// stack, and as a last resort scans for any vertex with live triangles.
/// The output references the same vertices; only triangle order changes.
pub fn tipsify(
    indices: &[u32],
    maximum_index: Option<u32>,
    cache_size: usize,
) -> Result<Vec<u32>, PipelineError> {
    let maximum_index = resolve_maximum_index(indices, maximum_index);
    validate(indices, maximum_index, cache_size)?;

    let vertex_count = maximum_index as usize + 1;
    let triangle_count = indices.len() / 3;

    let mut vertices: Vec<Vertex> = (0..vertex_count)
        .map(|_| Vertex {
            live_triangles: 0,
            time_stamp: 0,
            triangles: Vec::new(),
        })
        .collect();
    for (triangle, corners) in indices.chunks_exact(3).enumerate() {
        for &index in corners {
            let vertex = &mut vertices[index as usize];
            vertex.live_triangles += 1;
            vertex.triangles.push(triangle as u32);
        }
    }

    let mut emitted = vec![false; triangle_count];
    let mut output = Vec::with_capacity(indices.len());
    let mut dead_end: Vec<u32> = Vec::new();
    let mut scan_cursor = 0usize;

    // Cache times below `time - cache_size` have aged out.
    let mut time = cache_size as i64 + 1;
    let mut cursor = 0i64;

    while cursor != -1 {
        let mut one_ring: Vec<u32> = Vec::new();

        let triangles = vertices[cursor as usize].triangles.clone();
        for triangle in triangles {
            if emitted[triangle as usize] {
                continue;
            }
            emitted[triangle as usize] = true;

            let base = triangle as usize * 3;
            for &index in &indices[base..base + 3] {
                output.push(index);
                one_ring.push(index);
                dead_end.push(index);

                let vertex = &mut vertices[index as usize];
                vertex.live_triangles -= 1;
                if time - vertex.time_stamp > cache_size as i64 {
                    vertex.time_stamp = time;
                    time += 1;
                }
            }
        }

        // Best one-ring candidate: still cached after emitting its
        // remaining triangles, breaking ties toward least-recently cached.
        let mut best = -1i64;
        let mut best_priority = -1i64;
        for &candidate in &one_ring {
            let vertex = &vertices[candidate as usize];
            if vertex.live_triangles == 0 {
                continue;
            }
            let mut priority = 0;
            if time - vertex.time_stamp + 2 * i64::from(vertex.live_triangles)
                <= cache_size as i64
            {
                priority = time - vertex.time_stamp;
            }
            if priority > best_priority {
                best_priority = priority;
                best = i64::from(candidate);
            }
        }

        if best == -1 {
            // Dead-end recovery: pop skipped vertices, then linear scan.
            while let Some(vertex) = dead_end.pop() {
                if vertices[vertex as usize].live_triangles > 0 {
                    best = i64::from(vertex);
                    break;
                }
            }
            if best == -1 {
                while scan_cursor < vertex_count {
                    if vertices[scan_cursor].live_triangles > 0 {
                        best = scan_cursor as i64;
                        break;
                    }
                    scan_cursor += 1;
                }
            }
        }

        cursor = best;
    }

    Ok(output)
}
