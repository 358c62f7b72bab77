//! Hole carving, concavity removal and region labelling.
//!
//! Unwanted triangles are "infected" and the infection spreads to every
//! neighbor that is not shielded by a subsegment. Infected triangles are
//! then deleted, subsegments they leave exposed become boundary, and
//! vertices left without a live triangle are retired as undead. Regions are
//! labelled the same way, except that the flood only writes attributes.

use crate::core::algorithms::locate::LocateResult;
use crate::core::mesh::Mesh;
use crate::core::topology::{Osub, Otri, SubsegId, TriangleId};
use crate::core::vertex::{VertexKey, VertexKind};
use crate::geometry::point::Point;

impl Mesh {
    /// Removes triangles in holes and (unless `convex`) outside the segment
    /// boundary, then applies region labels and area caps.
    pub(crate) fn carve_holes(&mut self) {
        let span = tracing::debug_span!("carve", holes = self.holes.len(), regions = self.regions.len());
        let _guard = span.enter();

        let mut viri: Vec<TriangleId> = Vec::new();
        if !self.behavior.convex {
            self.infect_hull(&mut viri);
        }

        let holes = self.holes.clone();
        for hole in holes {
            let Some(tri) = self.locate_seed(hole) else {
                continue;
            };
            if !self.tri(tri.tri).infected {
                self.tri_mut(tri.tri).infected = true;
                viri.push(tri.tri);
            }
        }

        // Regions must be located while the triangulation is still convex.
        let regions = self.regions.clone();
        let mut region_tris: Vec<Option<TriangleId>> = Vec::with_capacity(regions.len());
        for seed in &regions {
            let tri = self
                .locate_seed(seed.point)
                .map(|o| o.tri)
                .filter(|&t| !self.tri(t).infected);
            region_tris.push(tri);
        }

        if !viri.is_empty() {
            let before = self.triangles.len();
            self.plague(viri);
            tracing::debug!(
                removed = before - self.triangles.len(),
                hull = self.hull_size,
                "carved holes and concavities"
            );
        }

        for (seed, tri) in regions.iter().zip(region_tris) {
            // The seed's triangle may have been eaten.
            match tri {
                Some(tri) if self.is_alive(tri) => {
                    let area = seed.area_bound.unwrap_or(-1.0);
                    self.region_plague(tri, seed.region, area);
                }
                _ => {}
            }
        }

        self.recent = Otri::OUTER;
        self.hull_handle();
    }

    /// Finds the triangle containing a hole or region seed, or `None` if the
    /// seed lies outside the mesh.
    fn locate_seed(&mut self, point: Point) -> Option<Otri> {
        if !self.bbox.contains(&point) {
            return None;
        }
        let start = self.hull_handle()?;
        let org = self.point(self.org(start));
        let dest = self.point(self.dest(start));
        // The seed must be left of the starting hull edge, or the walk would
        // wrongly report it inside the starting triangle.
        if self.predicates.orient2d(&org, &dest, &point) <= 0.0 {
            return None;
        }
        match self.precise_locate(point, start, false) {
            (LocateResult::Outside, _) => None,
            (_, o) => Some(o),
        }
    }

    /// Infects every hull triangle not protected by a subsegment; protected
    /// hull edges are marked as boundary.
    fn infect_hull(&mut self, viri: &mut Vec<TriangleId>) {
        let Some(start) = self.hull_handle() else {
            return;
        };
        let limit = 2 * self.triangles.high_water() + 8;
        let mut hulltri = start;
        for _ in 0..limit {
            if !self.tri(hulltri.tri).infected {
                let subseg = self.tspivot(hulltri);
                if subseg.is_none() {
                    self.tri_mut(hulltri.tri).infected = true;
                    viri.push(hulltri.tri);
                } else if self.subseg_marker(subseg) == 0 {
                    self.set_subseg_marker(subseg, 1);
                    self.mark_boundary_edge(hulltri);
                }
            }
            hulltri = hulltri.lnext();
            let mut next = self.oprev(hulltri);
            while !next.is_outer() {
                hulltri = next;
                next = self.oprev(hulltri);
            }
            if hulltri == start {
                return;
            }
        }
        tracing::warn!("hull traversal did not close while infecting the hull");
    }

    fn mark_boundary_edge(&mut self, o: Otri) {
        for v in [self.org(o), self.dest(o)] {
            if self.marker(v) == 0 {
                self.set_marker(v, 1);
            }
        }
    }

    /// Deallocates a subsegment, unlinking it from its chain neighbors.
    fn destroy_subseg(&mut self, s: SubsegId) {
        for orient in 0..2 {
            let this = Osub::new(s, orient);
            let adjacent = self.spivot(this);
            if !adjacent.is_none() && self.is_subseg_alive(adjacent.seg) && self.spivot(adjacent) == this {
                self.sdissolve(adjacent);
            }
        }
        self.kill_subseg(s);
    }

    /// Spreads the infection from `viri` and deletes every infected triangle.
    fn plague(&mut self, mut viri: Vec<TriangleId>) {
        let mut index = 0;
        while index < viri.len() {
            let tri = viri[index];
            index += 1;
            for orient in 0..3 {
                let testtri = Otri::new(tri, orient);
                let neighbor = self.sym(testtri);
                let subseg = self.tspivot(testtri);
                if neighbor.is_outer() || self.tri(neighbor.tri).infected {
                    if !subseg.is_none() && self.is_subseg_alive(subseg.seg) {
                        // Both sides are dying, so the subsegment dies too.
                        self.destroy_subseg(subseg.seg);
                        self.tsdissolve(testtri);
                        if !neighbor.is_outer() {
                            self.tsdissolve(neighbor);
                        }
                    }
                } else if subseg.is_none() {
                    self.tri_mut(neighbor.tri).infected = true;
                    viri.push(neighbor.tri);
                } else {
                    // The subsegment now faces outer space.
                    self.stdissolve(subseg);
                    if self.subseg_marker(subseg) == 0 {
                        self.set_subseg_marker(subseg, 1);
                    }
                    self.mark_boundary_edge(neighbor);
                }
            }
        }

        // Retire vertices that lose every live triangle.
        for &tri in &viri {
            for orient in 0..3 {
                let testtri = Otri::new(tri, orient);
                let vertex = self.org(testtri);
                if vertex == VertexKey::default() {
                    continue;
                }
                self.set_org(testtri, VertexKey::default());
                let mut survives = false;
                let mut neighbor = self.onext(testtri);
                while !neighbor.is_outer() && neighbor != testtri {
                    if self.tri(neighbor.tri).infected {
                        self.set_org(neighbor, VertexKey::default());
                    } else {
                        survives = true;
                    }
                    neighbor = self.onext(neighbor);
                }
                if neighbor.is_outer() {
                    neighbor = self.oprev(testtri);
                    while !neighbor.is_outer() {
                        if self.tri(neighbor.tri).infected {
                            self.set_org(neighbor, VertexKey::default());
                        } else {
                            survives = true;
                        }
                        neighbor = self.oprev(neighbor);
                    }
                }
                if !survives && self.kind(vertex).is_in_mesh() {
                    self.set_kind(vertex, VertexKind::Undead);
                    self.undead_count += 1;
                }
            }
        }

        // Update the hull size and disconnect the dead.
        for &tri in &viri {
            for orient in 0..3 {
                let testtri = Otri::new(tri, orient);
                let neighbor = self.sym(testtri);
                if neighbor.is_outer() {
                    self.hull_size = self.hull_size.saturating_sub(1);
                } else {
                    self.dissolve(neighbor);
                    self.hull_size += 1;
                }
            }
            self.kill_triangle(tri);
        }
    }

    /// Floods `region` and `area_bound` from `seed` up to subsegments.
    fn region_plague(&mut self, seed: TriangleId, region: i32, area_bound: f64) {
        let variable_area = self.behavior.variable_area;
        let mut viri = vec![seed];
        self.tri_mut(seed).infected = true;
        let mut index = 0;
        while index < viri.len() {
            let tri = viri[index];
            index += 1;
            {
                let record = self.tri_mut(tri);
                record.region = region;
                if variable_area {
                    record.area_bound = area_bound;
                }
            }
            for orient in 0..3 {
                let testtri = Otri::new(tri, orient);
                let neighbor = self.sym(testtri);
                if !neighbor.is_outer() && !self.tri(neighbor.tri).infected && self.tspivot(testtri).is_none() {
                    self.tri_mut(neighbor.tri).infected = true;
                    viri.push(neighbor.tri);
                }
            }
        }
        for tri in viri {
            self.tri_mut(tri).infected = false;
        }
    }
}
