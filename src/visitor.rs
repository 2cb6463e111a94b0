use crate::ast::{ChildNode, ComponentNode, LiteralNode, ModifierCall};

/// The ComponentVisitor trait defines the single authoritative traversal of a
/// parsed component forest.
///
/// Rules:
/// 1. Traversal is document pre-order: a node, then its children in source
///    order, then its modifiers in chain order.
/// 2. Implementers override `visit_*` methods to add behavior and call the
///    matching `walk_*` function to keep descending.
pub trait ComponentVisitor<'a> {
    fn visit_forest(&mut self, nodes: &'a [ComponentNode]) {
        walk_forest(self, nodes);
    }

    fn visit_component(&mut self, node: &'a ComponentNode) {
        walk_component(self, node);
    }

    fn visit_literal(&mut self, _literal: &'a LiteralNode) {
        // Leaf node, nothing to walk by default
    }

    fn visit_modifier(&mut self, _owner: &'a ComponentNode, _modifier: &'a ModifierCall) {
        // Leaf node, nothing to walk by default
    }
}

pub fn walk_forest<'a, V: ComponentVisitor<'a> + ?Sized>(visitor: &mut V, nodes: &'a [ComponentNode]) {
    for node in nodes {
        visitor.visit_component(node);
    }
}

pub fn walk_component<'a, V: ComponentVisitor<'a> + ?Sized>(visitor: &mut V, node: &'a ComponentNode) {
    for child in &node.children {
        match child {
            ChildNode::Component(c) => visitor.visit_component(c),
            ChildNode::Literal(l) => visitor.visit_literal(l),
        }
    }
    for modifier in &node.modifiers {
        visitor.visit_modifier(node, modifier);
    }
}

/// Component names in pre-order, one entry per node.
pub fn component_names(nodes: &[ComponentNode]) -> Vec<&str> {
    struct Names<'a> {
        names: Vec<&'a str>,
    }

    impl<'a> ComponentVisitor<'a> for Names<'a> {
        fn visit_component(&mut self, node: &'a ComponentNode) {
            self.names.push(&node.name);
            walk_component(self, node);
        }
    }

    let mut collector = Names { names: Vec::new() };
    collector.visit_forest(nodes);
    collector.names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    struct Trace {
        events: Vec<String>,
    }

    impl<'a> ComponentVisitor<'a> for Trace {
        fn visit_component(&mut self, node: &'a ComponentNode) {
            self.events.push(format!("enter {}", node.name));
            walk_component(self, node);
        }

        fn visit_literal(&mut self, literal: &'a LiteralNode) {
            self.events.push(format!("literal {}", literal.value.display_text()));
        }

        fn visit_modifier(&mut self, owner: &'a ComponentNode, modifier: &'a ModifierCall) {
            self.events.push(format!("modifier {}.{}", owner.name, modifier.name));
        }
    }

    #[test]
    fn test_traversal_order() {
        let nodes = parse(
            r#"VStack { Text("a").padding() Button("b") }.background("red")"#,
            "order.tachui",
        );
        let mut trace = Trace { events: vec![] };
        trace.visit_forest(&nodes);
        assert_eq!(
            trace.events,
            vec![
                "enter VStack",
                "enter Text",
                "literal a",
                "modifier Text.padding",
                "enter Button",
                "literal b",
                "modifier VStack.background",
            ]
        );
    }

    #[test]
    fn test_component_names_preorder() {
        let nodes = parse(r#"HStack { Text("x") VStack { Spacer() } } Text("y")"#, "n.tachui");
        assert_eq!(
            component_names(&nodes),
            vec!["HStack", "Text", "VStack", "Spacer", "Text"]
        );
    }
}
