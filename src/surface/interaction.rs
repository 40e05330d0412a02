// Declarative pointer policy for overlay composites: {event: effect}

/// Pointer events the surface reports for a single overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayEvent {
    /// Pointer moved onto the composite.
    PointerEnter,
    /// Pointer moved off the composite.
    PointerLeave,
    /// Pointer pressed inside the delete affordance.
    AffordancePressed,
    /// Pointer pressed on the composite outside the delete affordance.
    BodyPressed,
}

/// What the surface does in response to an [`OverlayEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayEffect {
    ShowDeleteAffordance,
    HideDeleteAffordance,
    RemoveComposite,
    /// Make the overlay the active one and start dragging it.
    SelectAndDrag,
}

/// Ordered `(event, effect)` table; every matching row applies, in order.
pub type InteractionPolicy = &'static [(OverlayEvent, OverlayEffect)];

/// Policy for stamp composites.
pub const STAMP_POLICY: InteractionPolicy = &[
    (OverlayEvent::PointerEnter, OverlayEffect::ShowDeleteAffordance),
    (OverlayEvent::PointerLeave, OverlayEffect::HideDeleteAffordance),
    (OverlayEvent::AffordancePressed, OverlayEffect::RemoveComposite),
    (OverlayEvent::BodyPressed, OverlayEffect::SelectAndDrag),
];

/// Effects `policy` prescribes for `event`, in table order.
pub fn effects_for(
    policy: InteractionPolicy,
    event: OverlayEvent,
) -> impl Iterator<Item = OverlayEffect> {
    policy
        .iter()
        .filter(move |(e, _)| *e == event)
        .map(|(_, effect)| *effect)
}
