use objmap_core::catalog::{Constructor, Member, Primitive, TypeKind};
use objmap_core::invoke::InvokeKind;
use objmap_core::profile::{HookDecl, ProfileItem};
use objmap_core::*;
use pretty_assertions::assert_eq;

fn run(catalog: &MemoryCatalog, input: PassInput) -> PassOutput {
    resolve(catalog, &Config::default(), &input, &CancellationToken::new()).unwrap()
}

/// Defines a class with read-write properties and a parameterless constructor.
fn class(catalog: &mut MemoryCatalog, name: &str, members: &[(&str, TypeId)]) -> TypeId {
    let ty = catalog.define_class(name);
    for (member_name, member_ty) in members {
        catalog
            .add_member(ty, Member::property(*member_name, *member_ty))
            .unwrap();
    }
    catalog
        .add_constructor(ty, Constructor::new("default", vec![]))
        .unwrap();
    ty
}

fn codes(output: &PassOutput) -> Vec<DiagnosticCode> {
    output.diagnostics.iter().map(|d| d.code).collect()
}

fn only_plan(output: &PassOutput) -> &MappingPlan {
    let plans: Vec<_> = output.groups.iter().flat_map(|g| &g.plans).collect();
    assert_eq!(plans.len(), 1, "expected exactly one plan: {plans:#?}");
    plans[0]
}

fn assigned(plan: &MappingPlan) -> Vec<(&str, &str)> {
    plan.assignments
        .iter()
        .map(|a| (a.source.name.as_str(), a.target.name.as_str()))
        .collect()
}

#[test]
fn matching_members_are_fully_covered_without_diagnostics() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let i64 = catalog.primitive(Primitive::I64);
    let string = catalog.string();
    let person = class(&mut catalog, "Person", &[("Id", i32), ("Name", string)]);
    let dto = class(&mut catalog, "PersonDto", &[("Id", i64), ("Name", string)]);

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(person, dto)));

    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
    let plan = only_plan(&output);
    assert_eq!(plan.strategy_name(), "construct");
    assert_eq!(assigned(plan), [("Id", "Id"), ("Name", "Name")]);
    assert_eq!(plan.assignments[0].conversion, Conversion::Implicit);
    assert_eq!(plan.assignments[1].conversion, Conversion::Identity);
    assert_eq!(plan.covered_members(), ["Id", "Name"]);
}

#[test]
fn reflexive_mapping_copies_every_member() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let string = catalog.string();
    let person = class(&mut catalog, "Person", &[("Id", i32), ("Name", string)]);

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(person, person)));

    assert!(output.diagnostics.is_empty());
    let plan = only_plan(&output);
    assert_eq!(assigned(plan), [("Id", "Id"), ("Name", "Name")]);
    assert!(plan.assignments.iter().all(|a| a.conversion == Conversion::Identity));
}

#[test]
fn constructor_arguments_are_not_assigned_twice() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let string = catalog.string();
    let person = class(&mut catalog, "Person", &[("Id", i32), ("Name", string)]);

    let dto = catalog.define_class("PersonDto");
    catalog.add_member(dto, Member::property("Id", i32)).unwrap();
    catalog.add_member(dto, Member::property("Name", string)).unwrap();
    catalog
        .add_constructor(
            dto,
            Constructor::new(
                "new",
                vec![Member::parameter("id", i32), Member::parameter("name", string)],
            ),
        )
        .unwrap();

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(person, dto)));

    assert!(output.diagnostics.is_empty());
    let plan = only_plan(&output);
    let Strategy::Construct(ctor) = &plan.strategy else {
        panic!("expected construct, got {:?}", plan.strategy);
    };
    assert_eq!(ctor.constructor.name, "new");
    assert!(plan.assignments.is_empty());
    assert_eq!(plan.covered_members(), ["id", "name"]);
}

#[test]
fn unmatched_target_members_are_reported_once() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("A", i32)]);
    let target = class(&mut catalog, "Target", &[("A", i32), ("B", i32), ("C", i32)]);

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(source, target)));

    assert_eq!(codes(&output), [DiagnosticCode::NotFoundMatchPropertyOrField]);
    let info = &output.diagnostics[0];
    assert_eq!(info.severity(), Severity::Info);
    assert_eq!(info.args, ["Target", "B, C"]);
    assert_eq!(assigned(only_plan(&output)), [("A", "A")]);
}

#[test]
fn type_mismatch_is_a_warning_and_member_is_skipped() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let string = catalog.string();
    let source = class(&mut catalog, "Source", &[("Id", string), ("Age", i32)]);
    let target = class(&mut catalog, "Target", &[("Id", i32), ("Age", i32)]);

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(source, target)));

    assert_eq!(codes(&output), [DiagnosticCode::PropertyOrFieldTypeNotMatch]);
    assert_eq!(output.diagnostics[0].args, ["Id", "Id(String)", "Id(i32)"]);
    assert_eq!(assigned(only_plan(&output)), [("Age", "Age")]);
}

#[test]
fn target_without_public_constructor_fails() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = catalog.define_class("Sealed");
    catalog.add_member(target, Member::property("Id", i32)).unwrap();

    let output = run(
        &catalog,
        PassInput::new().request(MappingRequest::new(source, target).at(RequestSite::new(3, 9))),
    );

    assert_eq!(codes(&output), [DiagnosticCode::NoAnyPublicConstructor]);
    assert_eq!(output.diagnostics[0].args, ["Sealed"]);
    assert_eq!(output.diagnostics[0].sites, [RequestSite::new(3, 9)]);
    assert!(output.has_errors());
    assert!(output.groups[0].plans.is_empty());
}

#[test]
fn unsatisfiable_constructors_fail() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = catalog.define_class("Target");
    catalog
        .add_constructor(target, Constructor::new("new", vec![Member::parameter("code", i32)]))
        .unwrap();

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(source, target)));

    assert_eq!(codes(&output), [DiagnosticCode::ConstructorMatchFailed]);
    assert_eq!(output.diagnostics[0].args, ["Target", "Source"]);
}

#[test]
fn type_mapping_hook_replaces_member_mapping() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = class(&mut catalog, "Target", &[("Unrelated", i32)]);
    let pair = MappingPair::new(source, target);

    let profile = ProfileDeclaration::new(ProfileId(1), "crate::Profile")
        .hook(HookKind::TypeMapping, "convert", pair);
    let output = run(
        &catalog,
        PassInput::new()
            .profile(profile)
            .request(MappingRequest::new(source, target))
            .request(MappingRequest::onto(source, target)),
    );

    assert!(output.diagnostics.is_empty());
    let plans = &output.groups[0].plans;
    assert_eq!(plans.len(), 2);
    for plan in plans {
        let Strategy::TypeMapping(hook) = &plan.strategy else {
            panic!("expected the hook, got {:?}", plan.strategy);
        };
        assert_eq!(hook.qualified_name(), "crate::Profile::convert");
        assert!(plan.assignments.is_empty());
    }
}

#[test]
fn prepare_hook_skips_consumed_members() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let string = catalog.string();
    let source = class(&mut catalog, "Source", &[("Id", i32), ("Name", string)]);
    let target = class(&mut catalog, "Target", &[("Id", i32), ("Name", string)]);
    let pair = MappingPair::new(source, target);

    let profile = ProfileDeclaration::new(ProfileId(1), "crate::Profile").item(ProfileItem::hook(
        HookKind::Prepare,
        HookDecl {
            method: "prepare".into(),
            pair,
            consumed: vec!["Name".into()],
            site: None,
        },
    ));
    let output = run(
        &catalog,
        PassInput::new()
            .profile(profile)
            .request(MappingRequest::new(source, target)),
    );

    assert!(output.diagnostics.is_empty());
    let plan = only_plan(&output);
    let Strategy::Prepare(hook) = &plan.strategy else {
        panic!("expected prepare, got {:?}", plan.strategy);
    };
    assert_eq!(hook.consumed, ["Name"]);
    assert_eq!(assigned(plan), [("Id", "Id")]);
}

#[test]
fn update_in_place_warns_about_unwritable_members() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32), ("Code", i32), ("Age", i32)]);

    let target = catalog.define_class("Target");
    catalog
        .add_member(target, Member::property("Id", i32).init_only())
        .unwrap();
    catalog
        .add_member(target, Member::field("Code", i32).read_only())
        .unwrap();
    catalog.add_member(target, Member::property("Age", i32)).unwrap();

    let output = run(&catalog, PassInput::new().request(MappingRequest::onto(source, target)));

    assert_eq!(
        codes(&output),
        [
            DiagnosticCode::ReadOnlyFieldCanNotMap,
            DiagnosticCode::InitOnlyPropertyCanNotMap
        ]
    );
    assert_eq!(output.diagnostics[0].args, ["Target", "Code"]);
    assert_eq!(output.diagnostics[1].args, ["Target", "Id"]);

    let plan = only_plan(&output);
    assert_eq!(plan.strategy, Strategy::UpdateInPlace);
    assert!(!plan.without_target_instance);
    assert_eq!(assigned(plan), [("Age", "Age")]);
    assert!(plan.null_check.target);
}

#[test]
fn constructed_targets_initialize_init_only_members() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = catalog.define_class("Target");
    catalog
        .add_member(target, Member::property("Id", i32).init_only())
        .unwrap();
    catalog
        .add_constructor(target, Constructor::new("default", vec![]))
        .unwrap();

    let output = run(&catalog, PassInput::new().request(MappingRequest::new(source, target)));

    assert!(output.diagnostics.is_empty());
    assert_eq!(assigned(only_plan(&output)), [("Id", "Id")]);
}

#[test]
fn primitive_and_string_types_are_ambiguous() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let string = catalog.string();
    let a = class(&mut catalog, "A", &[("Id", i32)]);
    let b = class(&mut catalog, "B", &[("Id", i32)]);

    let output = run(
        &catalog,
        PassInput::new()
            .request(MappingRequest::new(string, a).at(RequestSite::new(1, 1)))
            .request(MappingRequest::new(string, b).at(RequestSite::new(2, 1)))
            .request(MappingRequest::new(a, i32).at(RequestSite::new(3, 1))),
    );

    assert_eq!(
        codes(&output),
        [DiagnosticCode::AmbiguousMapType, DiagnosticCode::AmbiguousMapType]
    );

    // the source is reported once for every request using it
    assert_eq!(output.diagnostics[0].args, ["String"]);
    assert_eq!(
        output.diagnostics[0].sites,
        [RequestSite::new(1, 1), RequestSite::new(2, 1)]
    );
    assert_eq!(output.diagnostics[1].args, ["i32"]);
    assert!(output.groups.iter().all(|g| g.plans.is_empty()));
}

#[test]
fn disposable_and_scalar_types_are_ambiguous() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let a = class(&mut catalog, "A", &[("Id", i32)]);
    let file = catalog.define_disposable("File");
    let duration = catalog.define_scalar("Duration");

    let output = run(
        &catalog,
        PassInput::new()
            .request(MappingRequest::new(a, file))
            .request(MappingRequest::new(a, duration)),
    );

    let args: Vec<_> = output.diagnostics.iter().map(|d| d.args[0].as_str()).collect();
    assert_eq!(codes(&output), [DiagnosticCode::AmbiguousMapType; 2]);
    assert_eq!(args, ["File", "Duration"]);
}

#[test]
fn post_mapping_hook_is_attached() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = class(&mut catalog, "Target", &[("Id", i32)]);
    let pair = MappingPair::new(source, target);

    let output = run(
        &catalog,
        PassInput::new()
            .profile(ProfileDeclaration::new(ProfileId(1), "crate::Profile").hook(
                HookKind::PostMapping,
                "after",
                pair,
            ))
            .request(MappingRequest::new(source, target)),
    );

    let plan = only_plan(&output);
    assert_eq!(
        plan.post_mapping.as_ref().map(|h| h.qualified_name()),
        Some("crate::Profile::after".to_string())
    );
    assert_eq!(plan.strategy_name(), "construct");
}

#[test]
fn null_checks_follow_nullability() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let class_source = class(&mut catalog, "ClassSource", &[("Id", i32)]);
    let struct_source = catalog.define_struct("StructSource");
    catalog
        .add_member(struct_source, Member::field("Id", i32))
        .unwrap();
    let target = class(&mut catalog, "Target", &[("Id", i32)]);

    let output = run(
        &catalog,
        PassInput::new()
            .request(MappingRequest::new(class_source, target))
            .request(MappingRequest::new(struct_source, target)),
    );

    let checks: Vec<_> = output
        .groups
        .iter()
        .flat_map(|g| &g.plans)
        .map(|p| (p.null_check.source, p.null_check.target))
        .collect();
    assert_eq!(checks, [(true, false), (false, false)]);
}

#[test]
fn ignored_members_are_neither_mapped_nor_reported() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = class(&mut catalog, "Target", &[("Id", i32), ("Audit", i32)]);

    let output = run(
        &catalog,
        PassInput::new()
            .profile(ProfileDeclaration::new(ProfileId(1), "crate::Profile").ignore(
                "ignore_audit",
                target,
                &["Audit"],
            ))
            .request(MappingRequest::new(source, target)),
    );

    assert!(output.diagnostics.is_empty());
    assert_eq!(assigned(only_plan(&output)), [("Id", "Id")]);
}

#[test]
fn repeated_requests_merge_sites() {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let source = class(&mut catalog, "Source", &[("Id", i32)]);
    let target = class(&mut catalog, "Target", &[("Id", i32)]);

    let output = run(
        &catalog,
        PassInput::new()
            .request(MappingRequest::new(source, target).at(RequestSite::new(1, 5)))
            .request(MappingRequest::new(source, target).at(RequestSite::new(7, 5)))
            .request(MappingRequest::new(source, target).at(RequestSite::new(1, 5))),
    );

    let plan = only_plan(&output);
    assert_eq!(plan.sites, [RequestSite::new(1, 5), RequestSite::new(7, 5)]);
}

struct Collections {
    catalog: MemoryCatalog,
    vec: TypeId,
    person: TypeId,
    dto: TypeId,
    people: TypeId,
    dtos: TypeId,
}

fn collections() -> Collections {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let vec = catalog.define_generic("Vec", TypeKind::Value, true);
    let person = class(&mut catalog, "Person", &[("Id", i32)]);
    let dto = class(&mut catalog, "PersonDto", &[("Id", i32)]);
    let people = catalog.instantiate(vec, &[person]).unwrap();
    let dtos = catalog.instantiate(vec, &[dto]).unwrap();

    Collections {
        catalog,
        vec,
        person,
        dto,
        people,
        dtos,
    }
}

fn builtin(vec: TypeId) -> ProfileDeclaration {
    ProfileDeclaration::predefined(ProfileId(0), "::objmap::builtin").collection("collect", vec)
}

#[test]
fn collection_request_maps_elements_with_generated_mapping() {
    let c = collections();

    let output = run(
        &c.catalog,
        PassInput::new()
            .profile(builtin(c.vec))
            .request(MappingRequest::new(c.people, c.dtos)),
    );

    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
    assert_eq!(output.groups.len(), 2);

    let collection = &output.groups[0].plans[0];
    assert_eq!(collection.strategy_name(), "collection");
    assert_eq!(collection.source_types, [c.people]);
    assert!(!collection.null_check.source);

    let Strategy::Collection(conversion) = &collection.strategy else {
        unreachable!();
    };
    let elements = conversion.invocation().unwrap().as_collection().unwrap();
    assert_eq!(
        elements.element.invocation().unwrap().kind,
        InvokeKind::GeneratedMap {
            from: c.person,
            to: c.dto
        }
    );

    // the element mapping is generated alongside
    let element = &output.groups[1];
    assert_eq!(element.source, c.person);
    assert_eq!(element.plans[0].target, c.dto);
}

#[test]
fn collection_requests_from_different_sources_share_a_plan() {
    let mut c = collections();
    let array = c.catalog.array(c.person).unwrap();

    let output = run(
        &c.catalog,
        PassInput::new()
            .profile(builtin(c.vec))
            .request(MappingRequest::new(c.people, c.dtos))
            .request(MappingRequest::new(array, c.dtos)),
    );

    assert!(output.diagnostics.is_empty());
    let collection = &output.groups[0].plans[0];
    assert_eq!(collection.source_types, [c.people, array]);
    assert_eq!(output.groups[0].plans.len(), 1);
}

#[test]
fn collection_without_converter_is_undefined() {
    let c = collections();

    let output = run(&c.catalog, PassInput::new().request(MappingRequest::new(c.people, c.dtos)));

    assert_eq!(codes(&output), [DiagnosticCode::UndefinedCollectionMapping]);
    assert_eq!(
        output.diagnostics[0].args,
        ["Vec<Person>", "Vec<PersonDto>"]
    );
    // the element mapping is still produced
    assert_eq!(output.groups[1].plans.len(), 1);
}

#[test]
fn collection_onto_existing_instance_is_rejected() {
    let c = collections();

    let output = run(
        &c.catalog,
        PassInput::new()
            .profile(builtin(c.vec))
            .request(MappingRequest::onto(c.people, c.dtos)),
    );

    assert_eq!(codes(&output), [DiagnosticCode::CollectionMapIncorrectUsage]);
    assert_eq!(
        output.diagnostics[0].args,
        ["Vec<Person>", "Vec<PersonDto>"]
    );
    assert!(output.groups[0].plans.is_empty());
}

#[test]
fn collection_post_mapping_hook_is_attached() {
    let c = collections();
    let pair = MappingPair::new(c.people, c.dtos);

    let output = run(
        &c.catalog,
        PassInput::new()
            .profile(builtin(c.vec))
            .profile(ProfileDeclaration::new(ProfileId(1), "crate::Profile").hook(
                HookKind::PostMapping,
                "after_all",
                pair,
            ))
            .request(MappingRequest::new(c.people, c.dtos)),
    );

    let collection = &output.groups[0].plans[0];
    assert_eq!(
        collection.post_mapping.as_ref().map(|h| h.method.as_str()),
        Some("after_all")
    );
}

#[test]
fn value_element_collections_convert_elements_directly() {
    let mut c = collections();
    let i32 = c.catalog.primitive(Primitive::I32);
    let i64 = c.catalog.primitive(Primitive::I64);
    let ints = c.catalog.instantiate(c.vec, &[i32]).unwrap();
    let longs = c.catalog.instantiate(c.vec, &[i64]).unwrap();

    let output = run(
        &c.catalog,
        PassInput::new()
            .profile(builtin(c.vec))
            .request(MappingRequest::new(ints, longs)),
    );

    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
    let plan = only_plan(&output);
    let Strategy::Collection(conversion) = &plan.strategy else {
        unreachable!();
    };
    let elements = conversion.invocation().unwrap().as_collection().unwrap();
    assert_eq!(
        elements.element.invocation().unwrap().kind,
        InvokeKind::Cast { to: i64 }
    );
}
