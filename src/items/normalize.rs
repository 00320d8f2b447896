//! Config normalization that runs before any node is created.

use crate::config::{ItemConfig, ItemType};
use crate::error::ConfigurationError;
use crate::items::component::ComponentRegistry;

/// What a config is about to be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentContext {
    /// Creating a free-standing item, e.g. for a drag source.
    Detached,
    Root { sub_window: bool },
    Stack,
    Other,
}

/// Wraps a component in a stack unless it is going into a stack, is being
/// created free-standing, or is the top item of a sub-window. The wrapper
/// takes over the component's width and height.
pub fn wrap_bare_component(
    config: ItemConfig,
    parent: ParentContext,
) -> Result<ItemConfig, ConfigurationError> {
    let item_type = config.item_type()?;
    let needs_stack = item_type == ItemType::Component
        && !matches!(
            parent,
            ParentContext::Stack | ParentContext::Detached | ParentContext::Root { sub_window: true }
        );
    if !needs_stack {
        return Ok(config);
    }
    let mut stack = ItemConfig::stack(Vec::new());
    stack.width = config.width;
    stack.height = config.height;
    stack.content.push(config);
    Ok(stack)
}

/// Checks every type and component name in the tree.
pub fn validate(config: &ItemConfig, registry: &ComponentRegistry) -> Result<(), ConfigurationError> {
    let item_type = config.item_type()?;
    if item_type == ItemType::Component {
        registry.resolve(config.component_name.as_deref())?;
    }
    config
        .content
        .iter()
        .try_for_each(|child| validate(child, registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_under_row_is_wrapped() {
        let leaf = ItemConfig::component("a").with_width(30.0);
        let wrapped = wrap_bare_component(leaf.clone(), ParentContext::Other).unwrap();
        assert_eq!(wrapped.kind.as_deref(), Some("stack"));
        assert_eq!(wrapped.width, Some(30.0));
        assert_eq!(wrapped.content, vec![leaf]);
    }

    #[test]
    fn component_under_stack_or_subwindow_root_is_kept() {
        let leaf = ItemConfig::component("a");
        for ctx in [
            ParentContext::Stack,
            ParentContext::Detached,
            ParentContext::Root { sub_window: true },
        ] {
            let out = wrap_bare_component(leaf.clone(), ctx).unwrap();
            assert_eq!(out, leaf);
        }
        let out = wrap_bare_component(leaf, ParentContext::Root { sub_window: false }).unwrap();
        assert_eq!(out.kind.as_deref(), Some("stack"));
    }

    #[test]
    fn containers_pass_through() {
        let row = ItemConfig::row(vec![]);
        assert_eq!(wrap_bare_component(row.clone(), ParentContext::Other).unwrap(), row);
    }

    #[test]
    fn validation_reaches_nested_items() {
        let reg = ComponentRegistry::default();
        let bad = ItemConfig::row(vec![ItemConfig::stack(vec![ItemConfig {
            kind: Some("grid".into()),
            ..ItemConfig::default()
        }])]);
        assert!(matches!(
            validate(&bad, &reg),
            Err(ConfigurationError::UnknownType { .. })
        ));
        let missing = ItemConfig::column(vec![ItemConfig::default()]);
        assert!(matches!(
            validate(&missing, &reg),
            Err(ConfigurationError::MissingType)
        ));
        let unknown = ItemConfig::stack(vec![ItemConfig::component("nope")]);
        assert!(matches!(
            validate(&unknown, &reg),
            Err(ConfigurationError::UnknownComponent(_))
        ));
    }
}
