//! Controller and action metadata
//!
//! Actions describe themselves with [`register_action!`]; [`controllers_info`]
//! groups the registered descriptors into one [`ControllerInfo`] per
//! controller.

use serde::Serialize;

/// Link-time description of one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Area the controller belongs to, if any
    pub area: Option<&'static str>,
    /// Module path of the controller
    pub namespace: &'static str,
    /// Controller name
    pub controller: &'static str,
    /// Action name
    pub action: &'static str,
    /// Declared return type of the action
    pub return_type: &'static str,
    /// Attributes applied to the action
    pub action_attributes: &'static [&'static str],
    /// Attributes applied to the controller
    pub controller_attributes: &'static [&'static str],
}

inventory::collect!(ActionDescriptor);

#[doc(hidden)]
pub const fn first_or_none(values: &[&'static str]) -> Option<&'static str> {
    match values {
        [first, ..] => Some(*first),
        [] => None,
    }
}

/// Register an action for introspection
///
/// ```rust,ignore
/// register_action! {
///     controller: OrdersController,
///     action: index,
///     returns: Json<Vec<Order>>,
///     area: "Admin",
///     attributes: ["HttpGet"],
///     controller_attributes: ["Authorize"],
/// }
/// ```
///
/// `area`, `attributes` and `controller_attributes` are optional but must
/// appear in that order.
#[macro_export]
macro_rules! register_action {
    (
        controller: $controller:ident,
        action: $action:ident,
        returns: $ret:ty
        $(, area: $area:literal)?
        $(, attributes: [$($attr:literal),* $(,)?])?
        $(, controller_attributes: [$($cattr:literal),* $(,)?])?
        $(,)?
    ) => {
        $crate::inventory::submit! {
            $crate::ActionDescriptor {
                area: $crate::introspection::first_or_none(&[$($area)?]),
                namespace: module_path!(),
                controller: stringify!($controller),
                action: stringify!($action),
                return_type: stringify!($ret),
                action_attributes: &[$($($attr),*)?],
                controller_attributes: &[$($($cattr),*)?],
            }
        }
    };
}

/// Metadata for one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    /// Action name
    pub name: String,
    /// Declared return type
    pub return_type: String,
    /// Attributes applied to the action
    pub attributes: Vec<String>,
}

/// Metadata for one controller and its actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerInfo {
    /// Module path of the controller
    pub namespace: String,
    /// Area the controller belongs to, if any
    pub area_name: Option<String>,
    /// Controller name
    pub name: String,
    /// Attributes applied to the controller
    pub attributes: Vec<String>,
    /// Actions in name order
    pub actions: Vec<ActionInfo>,
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Group descriptors by controller
///
/// Descriptors are sorted by controller then action name; controllers are
/// keyed by name, area and namespace and keep first-seen order.
pub fn group_controllers<'a, I>(descriptors: I) -> Vec<ControllerInfo>
where
    I: IntoIterator<Item = &'a ActionDescriptor>,
{
    let mut sorted: Vec<&ActionDescriptor> = descriptors.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.controller
            .cmp(b.controller)
            .then_with(|| a.action.cmp(b.action))
    });

    let mut controllers: Vec<ControllerInfo> = Vec::new();
    for item in sorted {
        let action = ActionInfo {
            name: item.action.to_string(),
            return_type: item.return_type.to_string(),
            attributes: to_strings(item.action_attributes),
        };

        let existing = controllers.iter_mut().find(|c| {
            c.name == item.controller
                && c.area_name.as_deref() == item.area
                && c.namespace == item.namespace
        });

        match existing {
            Some(controller) => controller.actions.push(action),
            None => controllers.push(ControllerInfo {
                namespace: item.namespace.to_string(),
                area_name: item.area.map(str::to_string),
                name: item.controller.to_string(),
                attributes: to_strings(item.controller_attributes),
                actions: vec![action],
            }),
        }
    }

    controllers
}

/// Every registered controller
pub fn controllers_info() -> Vec<ControllerInfo> {
    group_controllers(inventory::iter::<ActionDescriptor>)
}

/// Registered controllers whose namespace starts with `prefix`
pub fn controllers_info_in(prefix: &str) -> Vec<ControllerInfo> {
    group_controllers(
        inventory::iter::<ActionDescriptor>
            .into_iter()
            .filter(|d| d.namespace.starts_with(prefix)),
    )
}
