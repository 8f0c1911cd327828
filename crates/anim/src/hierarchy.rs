use glam::Mat4;
use lavaworld_common::Transform;

use crate::AnimError;

/// A node in an imported scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    /// Local transform when no animation is applied.
    pub rest: Transform,
}

/// Flattened node tree with a parent-before-child evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHierarchy {
    nodes: Vec<Node>,
    order: Vec<usize>,
}

impl NodeHierarchy {
    pub fn new(nodes: Vec<Node>) -> Result<Self, AnimError> {
        let len = nodes.len();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); len];
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            match node.parent {
                Some(p) if p >= len => return Err(AnimError::NodeOutOfRange { index: p, len }),
                Some(p) => children[p].push(i),
                None => roots.push(i),
            }
        }

        // Breadth-first from the roots; anything unreached sits on a cycle.
        let mut order = Vec::with_capacity(len);
        let mut visited = vec![false; len];
        let mut cursor = 0;
        order.extend(roots);
        for &r in &order {
            visited[r] = true;
        }
        while cursor < order.len() {
            let current = order[cursor];
            cursor += 1;
            for &child in &children[current] {
                if !visited[child] {
                    visited[child] = true;
                    order.push(child);
                }
            }
        }
        if let Some(stuck) = visited.iter().position(|v| !v) {
            return Err(AnimError::ParentCycle(stuck));
        }

        Ok(Self { nodes, order })
    }

    /// A hierarchy with a single untransformed root.
    pub fn single_root(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                name: name.into(),
                parent: None,
                rest: Transform::IDENTITY,
            }],
            order: vec![0],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Find a node by name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Node indices ordered so every parent precedes its children.
    pub fn evaluation_order(&self) -> &[usize] {
        &self.order
    }

    pub fn rest_pose(&self) -> Vec<Transform> {
        self.nodes.iter().map(|n| n.rest).collect()
    }

    /// Compose local transforms into model-space matrices.
    ///
    /// `locals` must have one entry per node; `out` is resized to match.
    pub fn global_matrices(&self, locals: &[Transform], out: &mut Vec<Mat4>) {
        out.clear();
        out.resize(self.nodes.len(), Mat4::IDENTITY);
        for &i in &self.order {
            let local = locals[i].to_matrix();
            out[i] = match self.nodes[i].parent {
                Some(p) => out[p] * local,
                None => local,
            };
        }
    }
}

/// Joints and inverse bind matrices for one skinned mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    joints: Vec<usize>,
    inverse_bind: Vec<Mat4>,
}

impl Skin {
    pub fn new(joints: Vec<usize>, inverse_bind: Vec<Mat4>) -> Result<Self, AnimError> {
        if joints.len() != inverse_bind.len() {
            return Err(AnimError::SkinMismatch {
                joints: joints.len(),
                matrices: inverse_bind.len(),
            });
        }
        Ok(Self {
            joints,
            inverse_bind,
        })
    }

    /// Skin whose inverse bind matrices are all identity (glTF default).
    pub fn with_identity_binds(joints: Vec<usize>) -> Self {
        let inverse_bind = vec![Mat4::IDENTITY; joints.len()];
        Self {
            joints,
            inverse_bind,
        }
    }

    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Append one skinning matrix per joint: `global[joint] * inverse_bind`.
    pub fn write_joint_matrices(&self, globals: &[Mat4], out: &mut Vec<Mat4>) {
        out.extend(
            self.joints
                .iter()
                .zip(&self.inverse_bind)
                .map(|(&j, ibm)| globals.get(j).copied().unwrap_or(Mat4::IDENTITY) * *ibm),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn node(name: &str, parent: Option<usize>, x: f32) -> Node {
        Node {
            name: name.into(),
            parent,
            rest: Transform::from_position(Vec3::new(x, 0.0, 0.0)),
        }
    }

    #[test]
    fn children_listed_before_parents_still_order_correctly() {
        let h = NodeHierarchy::new(vec![
            node("hand", Some(1), 1.0),
            node("arm", Some(2), 1.0),
            node("root", None, 1.0),
        ])
        .unwrap();
        assert_eq!(h.evaluation_order(), &[2, 1, 0]);

        let mut globals = Vec::new();
        h.global_matrices(&h.rest_pose(), &mut globals);
        let hand = globals[0].transform_point3(Vec3::ZERO);
        assert_eq!(hand, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = NodeHierarchy::new(vec![node("a", Some(1), 0.0), node("b", Some(0), 0.0)]);
        assert_eq!(err, Err(AnimError::ParentCycle(0)));
    }

    #[test]
    fn dangling_parent_is_rejected() {
        let err = NodeHierarchy::new(vec![node("a", Some(5), 0.0)]);
        assert_eq!(err, Err(AnimError::NodeOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn find_by_name() {
        let h = NodeHierarchy::new(vec![node("root", None, 0.0), node("tail", Some(0), 0.0)])
            .unwrap();
        assert_eq!(h.find("tail"), Some(1));
        assert_eq!(h.find("wing"), None);
    }

    #[test]
    fn skin_matrices_undo_bind_pose() {
        let h = NodeHierarchy::new(vec![node("root", None, 2.0)]).unwrap();
        let bind = Transform::from_position(Vec3::new(2.0, 0.0, 0.0)).to_matrix();
        let skin = Skin::new(vec![0], vec![bind.inverse()]).unwrap();

        let mut globals = Vec::new();
        h.global_matrices(&h.rest_pose(), &mut globals);
        let mut palette = Vec::new();
        skin.write_joint_matrices(&globals, &mut palette);
        assert!(palette[0].abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn skin_length_mismatch() {
        assert!(matches!(
            Skin::new(vec![0, 1], vec![Mat4::IDENTITY]),
            Err(AnimError::SkinMismatch { joints: 2, matrices: 1 })
        ));
    }
}
