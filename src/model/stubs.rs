//! Stub declarations for the Celeste/Everest/MonoMod types the rules match.
//!
//! Lets a model be built in-process without the framework assemblies. Names
//! come from [`FrameworkNames`], so a configuration that renames a framework
//! type is reflected in the stubs too.

use super::{EventId, MethodId, ProgramBuilder, PropertyId, TypeId};
use crate::config::FrameworkNames;

const FRAMEWORK_ASSEMBLY: &str = "Celeste";
const MONOMOD_ASSEMBLY: &str = "MonoMod.RuntimeDetour";
const SYSTEM_ASSEMBLY: &str = "System.Runtime";

/// Ids of the declared framework types.
#[derive(Debug, Clone)]
pub struct FrameworkStubs {
    pub object: TypeId,
    pub string: TypeId,
    pub int: TypeId,
    pub il_cursor: TypeId,
    pub il_context: TypeId,
    pub hook: TypeId,
    pub entity: TypeId,
    pub scene: PropertyId,
    pub custom_entity_attribute: TypeId,
    pub tracked_attribute: TypeId,
    pub tracked_as_attribute: TypeId,
    pub tracker: TypeId,
    pub entity_list: TypeId,
    pub vector2: TypeId,
    pub entity_data: TypeId,
    pub entity_id: TypeId,
    pub level: TypeId,
    pub level_data: TypeId,
    /// One type per configured sequence type, in configuration order.
    pub sequence_types: Vec<TypeId>,
}

impl FrameworkStubs {
    pub fn install(builder: &mut ProgramBuilder, names: &FrameworkNames) -> Self {
        let object = builder.external_type("System.Object", SYSTEM_ASSEMBLY, None);
        let string = builder.external_type("System.String", SYSTEM_ASSEMBLY, Some(object));
        let int = builder.external_type("System.Int32", SYSTEM_ASSEMBLY, Some(object));
        let attribute = builder.external_type("System.Attribute", SYSTEM_ASSEMBLY, Some(object));

        let il_cursor = builder.external_type(&names.il_cursor, MONOMOD_ASSEMBLY, Some(object));
        let il_context = builder.external_type(&names.il_context, MONOMOD_ASSEMBLY, Some(object));
        let hook = builder.external_type(&names.hook, MONOMOD_ASSEMBLY, Some(object));

        let entity = builder.external_type(&names.entity, FRAMEWORK_ASSEMBLY, Some(object));
        let scene = builder.property(entity, &names.scene_property);

        let custom_entity_attribute =
            builder.external_type(&names.custom_entity_attribute, FRAMEWORK_ASSEMBLY, Some(attribute));
        let tracked_attribute =
            builder.external_type(&names.tracked_attribute, FRAMEWORK_ASSEMBLY, Some(attribute));
        let tracked_as_attribute =
            builder.external_type(&names.tracked_as_attribute, FRAMEWORK_ASSEMBLY, Some(attribute));
        let tracker = builder.external_type(&names.tracker, FRAMEWORK_ASSEMBLY, Some(object));
        let entity_list = builder.external_type(&names.entity_list, FRAMEWORK_ASSEMBLY, Some(object));

        let vector2 = builder.external_type(&names.vector2, FRAMEWORK_ASSEMBLY, Some(object));
        let entity_data = builder.external_type(&names.entity_data, FRAMEWORK_ASSEMBLY, Some(object));
        let entity_id = builder.external_type(&names.entity_id, FRAMEWORK_ASSEMBLY, Some(object));
        let level = builder.external_type(&names.level, FRAMEWORK_ASSEMBLY, Some(object));
        let level_data = builder.external_type(&names.level_data, FRAMEWORK_ASSEMBLY, Some(object));

        let sequence_types = names
            .sequence_types
            .iter()
            .map(|name| builder.external_type(name, SYSTEM_ASSEMBLY, None))
            .collect();

        let stubs = Self {
            object,
            string,
            int,
            il_cursor,
            il_context,
            hook,
            entity,
            scene,
            custom_entity_attribute,
            tracked_attribute,
            tracked_as_attribute,
            tracker,
            entity_list,
            vector2,
            entity_data,
            entity_id,
            level,
            level_data,
            sequence_types,
        };

        for name in names
            .cursor
            .remove
            .iter()
            .chain(&names.cursor.navigation)
            .chain(std::iter::once(&names.cursor.emit_delegate))
        {
            builder.method_named(il_cursor, name);
        }
        for name in ["GetEntities", "GetEntity", "CountEntities", "GetComponents"]
            .into_iter()
            .chain(names.tracker_checks.iter().map(String::as_str))
        {
            builder.method_named(tracker, name);
        }
        for name in &names.entity_list_scans {
            builder.method_named(entity_list, name);
        }

        stubs
    }

    /// A method on the bytecode cursor type, declared on first use.
    pub fn cursor_method(&self, builder: &mut ProgramBuilder, name: &str) -> MethodId {
        builder.method_named(self.il_cursor, name)
    }

    pub fn tracker_method(&self, builder: &mut ProgramBuilder, name: &str) -> MethodId {
        builder.method_named(self.tracker, name)
    }

    pub fn entity_list_method(&self, builder: &mut ProgramBuilder, name: &str) -> MethodId {
        builder.method_named(self.entity_list, name)
    }

    /// The `IEnumerator` stand-in: first configured sequence type.
    pub fn enumerator(&self) -> Option<TypeId> {
        self.sequence_types.first().copied()
    }

    /// Declare a generated hook event such as `On.Celeste.Player.Update`.
    ///
    /// `owner` is the full name of the generated hook class (`On.Celeste.Player`).
    pub fn hook_event(&self, builder: &mut ProgramBuilder, owner: &str, name: &str) -> EventId {
        let owner = builder.external_type(owner, "MMHOOK_Celeste", Some(self.object));
        builder.event(owner, name)
    }

    /// The `orig` delegate type of a generated hook.
    pub fn orig_delegate(&self, builder: &mut ProgramBuilder, full_name: &str) -> TypeId {
        builder.external_type(full_name, "MMHOOK_Celeste", Some(self.object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_declares_framework_types() {
        let names = FrameworkNames::default();
        let mut b = ProgramBuilder::new("Mod");
        let fw = FrameworkStubs::install(&mut b, &names);
        let program = b.finish();

        assert_eq!(program.full_type_name(fw.il_cursor), "MonoMod.Cil.ILCursor");
        assert_eq!(program.property(fw.scene).name, "Scene");
        assert_eq!(fw.sequence_types.len(), 4);
        assert_ne!(program.type_symbol(fw.entity).assembly, program.assembly);

        let members: Vec<_> = program
            .type_symbol(fw.il_cursor)
            .members
            .iter()
            .map(|&m| program.method(m).name.clone())
            .collect();
        assert!(members.contains(&"EmitDelegate".to_string()));
        assert!(members.contains(&"RemoveRange".to_string()));
    }
}
