// ABOUTME: End-to-end scenarios exercising Engine::execute against spec.md's §8 testable properties

use mscript::Engine;

fn eval_scalar(src: &str) -> f64 {
    let mut engine = Engine::new();
    engine.execute(src).expect("script should execute").as_scalar().expect("expected a scalar result")
}

fn eval_matrix(src: &str) -> Vec<f64> {
    let mut engine = Engine::new();
    engine.execute(src).expect("script should execute").as_matrix().expect("expected a matrix result").data.clone()
}

#[test]
fn determinant_of_two_by_two() {
    assert!((eval_scalar("det([1 2; 3 4])") - (-2.0)).abs() < 1e-10);
}

#[test]
fn inverse_times_original_is_identity() {
    let data = eval_matrix("inv([1 2; 3 4]) * [1 2; 3 4]");
    assert_eq!(data.len(), 4);
    assert!((data[0] - 1.0).abs() < 1e-10);
    assert!((data[1] - 0.0).abs() < 1e-10);
    assert!((data[2] - 0.0).abs() < 1e-10);
    assert!((data[3] - 1.0).abs() < 1e-10);
}

#[test]
fn eigenvalues_of_symmetric_matrix() {
    let mut eigs = eval_matrix("eig([2 1; 1 2])");
    eigs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert!((eigs[0] - 1.0).abs() < 1e-8);
    assert!((eigs[1] - 3.0).abs() < 1e-8);
}

#[test]
fn integral_of_sine_over_half_period() {
    assert!((eval_scalar("integral(@(x) sin(x), 0, pi)") - 2.0).abs() < 1e-6);
}

#[test]
fn fzero_finds_sqrt_two() {
    assert!((eval_scalar("fzero(@(x) x.^2 - 2, 1)") - 2.0f64.sqrt()).abs() < 1e-8);
}

#[test]
fn symbolic_diff_evaluates_at_a_point() {
    let mut engine = Engine::new();
    engine.execute("d = symdiff('x^2', 'x');").unwrap();
    let result = engine.execute("symeval(d, 3)").unwrap();
    assert!((result.as_scalar().unwrap() - 6.0).abs() < 1e-9);
}

#[test]
fn symbolic_solve_finds_both_roots_of_a_quadratic() {
    let mut roots = eval_matrix("symsolve('x^2 - 5*x + 6', 'x')");
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(roots.len(), 2);
    assert!((roots[0] - 2.0).abs() < 1e-6);
    assert!((roots[1] - 3.0).abs() < 1e-6);
}

#[test]
fn end_keyword_resolves_to_dimension_size() {
    assert!((eval_scalar("x = 1:5; x(end)") - 5.0).abs() < 1e-12);
    assert!((eval_scalar("x = 1:5; x(end-1)") - 4.0).abs() < 1e-12);
}

#[test]
fn row_and_column_indexing() {
    assert_eq!(eval_matrix("A = [1 2; 3 4]; A(2, :)"), vec![3.0, 4.0]);
    assert_eq!(eval_matrix("A = [1 2; 3 4]; A(:, 1)"), vec![1.0, 3.0]);
}

#[test]
fn ode45_exponential_decay_matches_analytic_solution() {
    let mut engine = Engine::new();
    let result = engine.execute("r = ode45(@(t,y) -y, [0 1], [1]); y = r{2}; y(end)").unwrap();
    let final_y = result.as_scalar().unwrap();
    assert!((final_y - (1.0 / std::f64::consts::E)).abs() < 0.03);
}

#[test]
fn empty_matrix_boundary_behaviour() {
    assert_eq!(eval_matrix("size([])"), vec![0.0, 0.0]);
    assert!((eval_scalar("length([])") - 0.0).abs() < 1e-12);
    assert!((eval_scalar("isempty([])") - 1.0).abs() < 1e-12);
}

#[test]
fn matrix_transpose_of_product_reverses_order() {
    let lhs = eval_matrix("A = [1 2; 3 4]; B = [5 6; 7 8]; (A*B)'");
    let rhs = eval_matrix("A = [1 2; 3 4]; B = [5 6; 7 8]; B'*A'");
    assert_eq!(lhs.len(), rhs.len());
    for (l, r) in lhs.iter().zip(rhs.iter()) {
        assert!((l - r).abs() < 1e-10);
    }
}

#[test]
fn transpose_is_its_own_inverse() {
    let original = eval_matrix("A = [1 2 3; 4 5 6]; A");
    let round_tripped = eval_matrix("A = [1 2 3; 4 5 6]; (A')'");
    assert_eq!(original, round_tripped);
}

#[test]
fn for_loop_over_row_vector_binds_scalars() {
    let total = eval_scalar("s = 0; for x = 1:5; s = s + x; end; s");
    assert!((total - 15.0).abs() < 1e-12);
}

#[test]
fn try_catch_recovers_from_runtime_error() {
    let mut engine = Engine::new();
    let result = engine
        .execute("caught = 0; try; x = [1 2] + [1 2 3]; catch err; caught = 1; end; caught")
        .unwrap();
    assert!((result.as_scalar().unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn multi_return_assignment_binds_all_outputs() {
    let mut engine = Engine::new();
    engine
        .execute(
            "function [a, b] = swap(x, y)\n  a = y;\n  b = x;\nend\n[p, q] = swap(1, 2);",
        )
        .unwrap();
    let p = engine.execute("p").unwrap().as_scalar().unwrap();
    let q = engine.execute("q").unwrap().as_scalar().unwrap();
    assert!((p - 2.0).abs() < 1e-12);
    assert!((q - 1.0).abs() < 1e-12);
}
