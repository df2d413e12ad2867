//! End-to-end scenarios: printing fixtures, the optimizer passes, and the
//! verifier's scope checking.

use pretty_assertions::assert_eq;

use gpir::analysis::DominanceAnalysis;
use gpir::ir::{
    print_function, print_module, Builder, BooleanOp, InstructionKind, Literal, Module, Stage,
    Type, Use,
};
use gpir::ir::{Definition, FuncId};
use gpir::transform::{CfgCanonicalization, CommonSubexpressionElimination, DeadCodeElimination};
use gpir::verify::{verify_module, verify_single_exit, VerifierError};

fn inst_use(id: gpir::ir::InstId) -> Use {
    Use::Def(Definition::Instruction(id))
}

#[test]
fn test_struct_literal_printing() {
    let mut module = Module::new("struct_literal", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let decl = b.create_struct("TestStruct1");
    decl.append_field("foo", Type::Bool);

    let f = b.create_function("initialize_struct1", vec![], Type::void());
    b.append_block(f, "entry", vec![]);
    b.literal(
        Literal::Struct(vec![
            ("foo".into(), Use::bool_literal(true)),
            ("bar".into(), Use::bool_literal(false)),
        ]),
        Type::Struct(decl),
    );
    b.ret(None);

    assert_eq!(
        print_module(&module),
        "module \"struct_literal\"\n\
         stage raw\n\
         \n\
         struct $TestStruct1 {\n    \
         #foo: bool\n\
         }\n\
         \n\
         func @initialize_struct1: () -> () {\n\
         'entry():\n    \
         %0.0 = literal {#foo = true: bool, #bar = false: bool}: $TestStruct1\n    \
         return\n\
         }\n"
    );
}

#[test]
fn test_enum_literal_printing() {
    let mut module = Module::new("enum_literal", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let decl = b.create_enum("TestEnum1");
    decl.append_case("foo", vec![Type::Bool, Type::Bool]);
    decl.append_case("bar", vec![]);
    decl.append_case(
        "baz",
        vec![
            Type::Enum(decl.clone()),
            Type::Bool,
            Type::Enum(decl.clone()),
        ],
    );
    let enum_ty = Type::Enum(decl);

    let f = b.create_function("initialize_enum1", vec![], Type::void());
    b.append_block(f, "entry", vec![]);
    b.literal(
        Literal::EnumCase("foo".into(), vec![Use::bool_literal(true), Use::bool_literal(false)]),
        enum_ty.clone(),
    );
    let bar = b.literal(Literal::EnumCase("bar".into(), vec![]), enum_ty.clone());
    let nested_bar = Use::Literal(enum_ty.clone(), Literal::EnumCase("bar".into(), vec![]));
    b.literal(
        Literal::EnumCase(
            "baz".into(),
            vec![nested_bar.clone(), Use::bool_literal(true), nested_bar],
        ),
        enum_ty.clone(),
    );
    b.literal(
        Literal::EnumCase(
            "baz".into(),
            vec![inst_use(bar), Use::bool_literal(false), inst_use(bar)],
        ),
        enum_ty.clone(),
    );
    b.ret(None);

    verify_module(&module).unwrap();
    let printed = print_function(&module, module.function(f));
    assert_eq!(
        printed,
        "func @initialize_enum1: () -> () {\n\
         'entry():\n    \
         %0.0 = literal ?foo(true: bool, false: bool): $TestEnum1\n    \
         %0.1 = literal ?bar(): $TestEnum1\n    \
         %0.2 = literal ?baz(?bar(): $TestEnum1, true: bool, ?bar(): $TestEnum1): $TestEnum1\n    \
         %0.3 = literal ?baz(%0.1: $TestEnum1, false: bool, %0.1: $TestEnum1): $TestEnum1\n    \
         return\n\
         }\n"
    );
}

/// One live boolean, two dead ones chained through def-use, then a
/// conditional. Only the dead pair goes.
#[test]
fn test_dce_scenario() {
    let mut module = Module::new("dce", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let f = b.create_function("f", vec![Type::Bool, Type::Bool], Type::Bool);
    let entry = b.append_block(
        f,
        "entry",
        vec![("x".into(), Type::Bool), ("y".into(), Type::Bool)],
    );
    let then = b.append_block(f, "then", vec![]);
    let els = b.append_block(f, "else", vec![]);

    let x = Use::Def(Definition::Argument(entry, 0));
    let y = Use::Def(Definition::Argument(entry, 1));
    b.move_to_end(f, entry);
    let used = b.boolean(BooleanOp::And, x.clone(), y.clone());
    let dead1 = b.boolean(BooleanOp::Or, x.clone(), y.clone());
    let _dead2 = b.boolean(BooleanOp::And, inst_use(dead1), x.clone());
    b.conditional(inst_use(used), then, vec![], els, vec![]);
    b.move_to_end(f, then);
    b.ret(Some(Use::bool_literal(true)));
    b.move_to_end(f, els);
    b.ret(Some(Use::bool_literal(false)));

    verify_module(&module).unwrap();
    let changed = module
        .map_transform(&DeadCodeElimination::new(), true)
        .unwrap();
    assert!(changed);

    let function = module.function(f);
    assert_eq!(function.block(entry).instructions().len(), 2);
    assert!(function.is_instruction_live(used));
    assert!(!function.is_instruction_live(dead1));
    // The conditional and its successors are untouched.
    assert_eq!(function.successors_of(entry), vec![then, els]);
    assert_eq!(function.block(then).instructions().len(), 1);
    assert_eq!(function.block(els).instructions().len(), 1);

    let changed = module
        .map_transform(&DeadCodeElimination::new(), true)
        .unwrap();
    assert!(!changed);
}

/// Six pairwise-identical booleans collapse to four in the entry block, and
/// a duplicate after the join collapses onto its dominating representative.
#[test]
fn test_cse_scenario() {
    let mut module = Module::new("cse", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let f = b.create_function("f", vec![Type::Bool, Type::Bool], Type::Bool);
    let entry = b.append_block(
        f,
        "entry",
        vec![("x".into(), Type::Bool), ("y".into(), Type::Bool)],
    );
    let tail = b.append_block(f, "tail", vec![]);

    let x = Use::Def(Definition::Argument(entry, 0));
    let y = Use::Def(Definition::Argument(entry, 1));
    b.move_to_end(f, entry);
    let common1 = b.boolean(BooleanOp::Or, x.clone(), y.clone());
    let common1_dup = b.boolean(BooleanOp::Or, x.clone(), y.clone());
    let common2 = b.boolean(BooleanOp::And, inst_use(common1), Use::bool_literal(true));
    let common2_dup = b.boolean(BooleanOp::And, inst_use(common1_dup), Use::bool_literal(true));
    let common3 = b.boolean(BooleanOp::Or, inst_use(common2), Use::bool_literal(false));
    let common3_dup = b.boolean(BooleanOp::Or, inst_use(common2_dup), Use::bool_literal(false));
    let combined = b.boolean(BooleanOp::And, inst_use(common3), inst_use(common3_dup));
    b.branch(tail, vec![]);
    b.move_to_end(f, tail);
    let after_join = b.boolean(BooleanOp::Or, inst_use(common2), Use::bool_literal(false));
    let result = b.boolean(BooleanOp::And, inst_use(after_join), inst_use(combined));
    b.ret(Some(inst_use(result)));

    verify_module(&module).unwrap();
    let changed = module
        .map_transform(&CommonSubexpressionElimination::new(), true)
        .unwrap();
    assert!(changed);

    let function = module.function(f);
    let entry_booleans = function
        .block(entry)
        .instructions()
        .iter()
        .filter(|&&id| {
            matches!(
                function.instruction(id).kind,
                InstructionKind::BooleanBinary { .. }
            )
        })
        .count();
    assert_eq!(entry_booleans, 4);
    // The post-join duplicate of `or %common2, false` collapsed onto the
    // dominating representative in the entry block.
    assert!(!function.is_instruction_live(after_join));
    assert!(function.is_instruction_live(common3));
    let InstructionKind::BooleanBinary { lhs, .. } = &function.instruction(result).kind else {
        panic!("result is a boolean");
    };
    assert_eq!(*lhs, inst_use(common3));

    let changed = module
        .map_transform(&CommonSubexpressionElimination::new(), true)
        .unwrap();
    assert!(!changed);
}

/// Two returning blocks inside a nested conditional and one direct
/// else-return: one join block, all returns rewritten, exit printed last.
#[test]
fn test_cfg_canonicalization_scenario() {
    let mut module = Module::new("cfgcan", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let f = b.create_function("f", vec![Type::Bool, Type::Bool], Type::Bool);
    let entry = b.append_block(
        f,
        "entry",
        vec![("c1".into(), Type::Bool), ("c2".into(), Type::Bool)],
    );
    let then = b.append_block(f, "then", vec![]);
    let a = b.append_block(f, "a", vec![]);
    let bb = b.append_block(f, "b", vec![]);
    let els = b.append_block(f, "else", vec![]);

    let c1 = Use::Def(Definition::Argument(entry, 0));
    let c2 = Use::Def(Definition::Argument(entry, 1));
    b.move_to_end(f, entry);
    b.conditional(c1.clone(), then, vec![], els, vec![]);
    b.move_to_end(f, then);
    b.conditional(c2, a, vec![], bb, vec![]);
    b.move_to_end(f, a);
    b.ret(Some(Use::bool_literal(true)));
    b.move_to_end(f, bb);
    b.ret(Some(c1));
    b.move_to_end(f, els);
    b.ret(Some(Use::bool_literal(false)));

    verify_module(&module).unwrap();
    let changed = module
        .map_transform(&CfgCanonicalization::new(), true)
        .unwrap();
    assert!(changed);

    let function = module.function(f);
    verify_single_exit(function).unwrap();
    assert_eq!(
        print_function(&module, function),
        "func @f: (bool, bool) -> bool {\n\
         'entry(%c1: bool, %c2: bool):\n    \
         conditional %c1: bool then 'then() else 'else()\n\
         'then():\n    \
         conditional %c2: bool then 'a() else 'b()\n\
         'a():\n    \
         branch 'then_join(true: bool)\n\
         'b():\n    \
         branch 'then_join(%c1: bool)\n\
         'else():\n    \
         branch 'exit(false: bool)\n\
         'then_join(%then_join.0: bool):\n    \
         branch 'exit(%then_join.0: bool)\n\
         'exit(%exit_value: bool):\n    \
         return %exit_value: bool\n\
         }\n"
    );

    let changed = module
        .map_transform(&CfgCanonicalization::new(), true)
        .unwrap();
    assert!(!changed);
}

/// An operand defined in a sibling block is out of scope.
#[test]
fn test_verifier_rejects_use_before_def() {
    let mut module = Module::new("scope", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let f = b.create_function("f", vec![Type::Bool], Type::Bool);
    let entry = b.append_block(f, "entry", vec![("x".into(), Type::Bool)]);
    let left = b.append_block(f, "left", vec![]);
    let right = b.append_block(f, "right", vec![]);

    let x = Use::Def(Definition::Argument(entry, 0));
    b.move_to_end(f, entry);
    b.conditional(x.clone(), left, vec![], right, vec![]);
    b.move_to_end(f, right);
    let defined_right = b.not(x.clone());
    b.ret(Some(inst_use(defined_right)));
    b.move_to_end(f, left);
    // `right` does not dominate `left`.
    let bad = b.boolean(BooleanOp::And, inst_use(defined_right), x);
    b.ret(Some(inst_use(bad)));

    let err = verify_module(&module).unwrap_err();
    assert!(matches!(err, VerifierError::UseBeforeDef { .. }));
}

/// After verification, every operand definition properly dominates its user.
#[test]
fn test_dominance_property_on_verified_function() {
    let mut module = Module::new("dom", Stage::Raw);
    let mut b = Builder::new(&mut module);
    let f = b.create_function("f", vec![Type::Bool], Type::Bool);
    let entry = b.append_block(f, "entry", vec![("x".into(), Type::Bool)]);
    let exit = b.append_block(f, "exit", vec![("v".into(), Type::Bool)]);
    let x = Use::Def(Definition::Argument(entry, 0));
    b.move_to_end(f, entry);
    let a = b.not(x.clone());
    let c = b.boolean(BooleanOp::Or, inst_use(a), x);
    b.branch(exit, vec![inst_use(c)]);
    b.move_to_end(f, exit);
    b.ret(Some(Use::Def(Definition::Argument(exit, 0))));

    verify_module(&module).unwrap();
    let function = module.function(FuncId(0));
    let dominance = function.analysis::<DominanceAnalysis>();
    for id in function.ordered_instructions() {
        function.instruction(id).kind.for_each_use(|u| {
            if let Some(def) = u.as_definition() {
                assert!(dominance.properly_dominates_def(def, id, function));
            }
        });
    }
}
