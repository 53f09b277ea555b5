use crate::core::geometry::{Bounds3, Hit, Point3, Ray};
use crate::core::pbrt::{Float, INFINITY, SAH_NUM_BUCKETS, SAH_TRAVERSAL_COST};

use super::Primitive;

struct PrimitiveInfo {
    index: usize,
    bounds: Bounds3,
    centroid: Point3,
}

/// Interior/leaf tree built during construction; consumed by `flatten`.
enum BuildNode {
    Leaf {
        bounds: Bounds3,
        first_prim_offset: usize,
        n_primitives: usize,
    },
    Interior {
        bounds: Bounds3,
        axis: usize,
        children: [Box<BuildNode>; 2],
    },
}

impl BuildNode {
    fn bounds(&self) -> Bounds3 {
        match self {
            BuildNode::Leaf { bounds, .. } => *bounds,
            BuildNode::Interior { bounds, .. } => *bounds,
        }
    }
}

/// Flattened traversal node (spec §4.3; field shapes grounded on
/// `examples/hackmad-pbr-rust/src/accelerators/bvh/common.rs::LinearBVHNode`,
/// widened here since bounds are stored in double precision).
#[derive(Clone, Copy)]
struct LinearBvhNode {
    bounds: Bounds3,
    /// Leaf: offset into `Bvh::ordered_primitives`. Interior: offset to the
    /// second child in the flattened array.
    offset: u32,
    /// Leaf: primitive count. Interior: 0.
    n_primitives: u16,
    /// Interior: split axis (0/1/2), used to choose traversal order.
    axis: u8,
}

/// The built acceleration structure: a flattened node array plus the
/// primitives in traversal order (spec §4.3 "Build"/"Traversal").
pub struct Bvh {
    nodes: Vec<LinearBvhNode>,
    primitives: Vec<Primitive>,
}

fn bucket_for(centroid_axis_value: Float, lo: Float, hi: Float, num_buckets: usize) -> usize {
    if hi - lo < 1e-12 {
        return 0;
    }
    let b = ((centroid_axis_value - lo) / (hi - lo) * num_buckets as Float) as usize;
    b.min(num_buckets - 1)
}

impl Bvh {
    pub fn build(primitives: Vec<Primitive>) -> Self {
        let mut infos: Vec<PrimitiveInfo> = primitives
            .iter()
            .enumerate()
            .map(|(i, p)| PrimitiveInfo {
                index: i,
                bounds: p.bounding_box(),
                centroid: p.centroid(),
            })
            .collect();

        let mut ordered_indices = Vec::with_capacity(primitives.len());
        let root = if infos.is_empty() {
            BuildNode::Leaf {
                bounds: Bounds3::empty(),
                first_prim_offset: 0,
                n_primitives: 0,
            }
        } else {
            build_recursive(&mut infos, &mut ordered_indices)
        };

        let ordered_primitives: Vec<Primitive> = {
            // `primitives` is consumed to reorder it to match `ordered_indices`
            // without cloning (meshes/lights are not Clone).
            let mut slots: Vec<Option<Primitive>> = primitives.into_iter().map(Some).collect();
            ordered_indices
                .iter()
                .map(|&i| slots[i].take().expect("each primitive used exactly once"))
                .collect()
        };

        let mut nodes = Vec::new();
        flatten(&root, &mut nodes);

        Self {
            nodes,
            primitives: ordered_primitives,
        }
    }

    /// Closest-hit query within `[t_min, t_max]` (spec §4.3 "Traversal").
    pub fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Hit> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut closest = t_max;
        let mut result = None;
        let mut stack: Vec<usize> = Vec::with_capacity(64);
        let mut current = 0usize;
        let inv_d = [1.0 / ray.d.x, 1.0 / ray.d.y, 1.0 / ray.d.z];
        let dir_is_neg = [inv_d[0] < 0.0, inv_d[1] < 0.0, inv_d[2] < 0.0];

        loop {
            let node = &self.nodes[current];
            if node.bounds.hit(ray, t_min, closest).is_some() {
                if node.n_primitives > 0 {
                    let first = node.offset as usize;
                    for prim in &self.primitives[first..first + node.n_primitives as usize] {
                        if let Some(hit) = prim.intersect(ray, t_min, closest) {
                            closest = hit.t;
                            result = Some(hit);
                        }
                    }
                    match stack.pop() {
                        Some(next) => current = next,
                        None => break,
                    }
                } else {
                    // Visit the near child first; push the far child.
                    if dir_is_neg[node.axis as usize] {
                        stack.push(current + 1);
                        current = node.offset as usize;
                    } else {
                        stack.push(node.offset as usize);
                        current = current + 1;
                    }
                }
            } else {
                match stack.pop() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        result
    }

    /// Shadow/occlusion query: true as soon as any primitive in
    /// `[t_min, t_max]` is hit and casts a shadow.
    pub fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let mut stack: Vec<usize> = Vec::with_capacity(64);
        let mut current = 0usize;
        let inv_d = [1.0 / ray.d.x, 1.0 / ray.d.y, 1.0 / ray.d.z];
        let dir_is_neg = [inv_d[0] < 0.0, inv_d[1] < 0.0, inv_d[2] < 0.0];

        loop {
            let node = &self.nodes[current];
            if node.bounds.hit(ray, t_min, t_max).is_some() {
                if node.n_primitives > 0 {
                    let first = node.offset as usize;
                    for prim in &self.primitives[first..first + node.n_primitives as usize] {
                        if let Some(hit) = prim.intersect(ray, t_min, t_max) {
                            if hit.material.casts_shadow() {
                                return true;
                            }
                        }
                    }
                    match stack.pop() {
                        Some(next) => current = next,
                        None => break,
                    }
                } else {
                    if dir_is_neg[node.axis as usize] {
                        stack.push(current + 1);
                        current = node.offset as usize;
                    } else {
                        stack.push(node.offset as usize);
                        current = current + 1;
                    }
                }
            } else {
                match stack.pop() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        false
    }

    pub fn world_bound(&self) -> Bounds3 {
        self.nodes.first().map(|n| n.bounds).unwrap_or_else(Bounds3::empty)
    }
}

fn build_recursive(infos: &mut [PrimitiveInfo], ordered: &mut Vec<usize>) -> BuildNode {
    let bounds = infos
        .iter()
        .fold(Bounds3::empty(), |b, i| b.union(&i.bounds));

    if infos.len() == 1 {
        let first = ordered.len();
        ordered.push(infos[0].index);
        return BuildNode::Leaf {
            bounds,
            first_prim_offset: first,
            n_primitives: 1,
        };
    }

    let centroid_bounds = infos
        .iter()
        .fold(Bounds3::empty(), |b, i| b.union_point(i.centroid));
    let axis = centroid_bounds.max_extent();

    if (centroid_bounds.max[axis] - centroid_bounds.min[axis]).abs() < 1e-12 {
        let first = ordered.len();
        for info in infos.iter() {
            ordered.push(info.index);
        }
        return BuildNode::Leaf {
            bounds,
            first_prim_offset: first,
            n_primitives: infos.len(),
        };
    }

    if infos.len() == 2 {
        infos.sort_by(|a, b| a.centroid[axis].partial_cmp(&b.centroid[axis]).unwrap());
        let left = build_recursive(&mut infos[0..1], ordered);
        let right = build_recursive(&mut infos[1..2], ordered);
        return BuildNode::Interior {
            bounds,
            axis,
            children: [Box::new(left), Box::new(right)],
        };
    }

    let lo = centroid_bounds.min[axis];
    let hi = centroid_bounds.max[axis];
    let nb = SAH_NUM_BUCKETS;
    let mut counts = vec![0usize; nb];
    let mut bucket_bounds = vec![Bounds3::empty(); nb];
    let mut assigned_bucket = vec![0usize; infos.len()];
    for (k, info) in infos.iter().enumerate() {
        let b = bucket_for(info.centroid[axis], lo, hi, nb);
        assigned_bucket[k] = b;
        counts[b] += 1;
        bucket_bounds[b] = bucket_bounds[b].union(&info.bounds);
    }

    let mut best_cost = INFINITY;
    let mut best_split = 0usize;
    for split in 0..nb - 1 {
        let mut count_l = 0usize;
        let mut bounds_l = Bounds3::empty();
        for b in 0..=split {
            count_l += counts[b];
            bounds_l = bounds_l.union(&bucket_bounds[b]);
        }
        let mut count_r = 0usize;
        let mut bounds_r = Bounds3::empty();
        for b in split + 1..nb {
            count_r += counts[b];
            bounds_r = bounds_r.union(&bucket_bounds[b]);
        }
        if count_l == 0 || count_r == 0 {
            continue;
        }
        let cost = SAH_TRAVERSAL_COST
            + (bounds_l.surface_area() * count_l as Float
                + bounds_r.surface_area() * count_r as Float)
                / bounds.surface_area();
        if cost < best_cost {
            best_cost = cost;
            best_split = split;
        }
    }

    let mut left = Vec::new();
    let mut right = Vec::new();
    for (k, info) in infos.iter().enumerate() {
        if assigned_bucket[k] <= best_split {
            left.push(PrimitiveInfo {
                index: info.index,
                bounds: info.bounds,
                centroid: info.centroid,
            });
        } else {
            right.push(PrimitiveInfo {
                index: info.index,
                bounds: info.bounds,
                centroid: info.centroid,
            });
        }
    }

    if left.is_empty() || right.is_empty() {
        // SAH found no useful split (can happen with heavily clustered
        // centroids): fall back to an equal-count split by the same axis.
        infos.sort_by(|a, b| a.centroid[axis].partial_cmp(&b.centroid[axis]).unwrap());
        let mid = infos.len() / 2;
        let (l, r) = infos.split_at_mut(mid);
        let left_node = build_recursive(l, ordered);
        let right_node = build_recursive(r, ordered);
        return BuildNode::Interior {
            bounds,
            axis,
            children: [Box::new(left_node), Box::new(right_node)],
        };
    }

    let left_node = build_recursive(&mut left, ordered);
    let right_node = build_recursive(&mut right, ordered);
    BuildNode::Interior {
        bounds,
        axis,
        children: [Box::new(left_node), Box::new(right_node)],
    }
}

fn flatten(node: &BuildNode, out: &mut Vec<LinearBvhNode>) -> usize {
    let my_index = out.len();
    match node {
        BuildNode::Leaf {
            bounds,
            first_prim_offset,
            n_primitives,
        } => {
            out.push(LinearBvhNode {
                bounds: *bounds,
                offset: *first_prim_offset as u32,
                n_primitives: *n_primitives as u16,
                axis: 0,
            });
        }
        BuildNode::Interior {
            bounds,
            axis,
            children,
        } => {
            out.push(LinearBvhNode {
                bounds: *bounds,
                offset: 0,
                n_primitives: 0,
                axis: *axis as u8,
            });
            flatten(&children[0], out);
            let second_child_offset = flatten(&children[1], out);
            out[my_index].offset = second_child_offset as u32;
        }
    }
    my_index
}
