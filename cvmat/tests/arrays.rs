/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Functions written against the parameter-role traits accept every array kind.

use cvmat::{
    Depth, InputArray, InputOutputArray, Mat, MatError, MatExpr, MatType, OutputArray, Result,
    TypedMat,
};

/// Sum of the scalars of a single-channel vector.
fn vector_sum<'a>(input: impl Into<InputArray<'a>>) -> Result<f64> {
    let input = input.into();
    let Some(len) = input.check_vector(1, None, false) else {
        return Err(MatError::BadChannels(input.mat_type().channels()));
    };
    let mut column = Mat::default();
    input.copy_to(&mut column)?;
    let mut f = Mat::default();
    column.convert_to(&mut f, Some(Depth::F64), 1.0, 0.0)?;
    let values = f.as_slice::<f64>()?;
    assert_eq!(values.len(), len);
    Ok(values.iter().sum())
}

/// Write `0, 1, 2, ..` into a `len x 1` destination of its own type.
fn fill_ramp<O: OutputArray + ?Sized>(dst: &mut O, len: usize) -> Result<()> {
    let ty = dst.fixed_type().unwrap_or(MatType::S32C1);
    dst.create(&[len, 1], ty)?;
    let m = dst.mat_mut();
    let ramp: Vec<f64> = (0..len).map(|v| v as f64).collect();
    let src = Mat::from_slice(&ramp)?;
    src.convert_to(m, Some(ty.depth()), 1.0, 0.0)
}

fn negate_in_place<A: InputOutputArray>(a: &mut A) -> Result<()> {
    let src = a.input().to_mat()?;
    (MatExpr::from(src) * -1.0).assign_to(a)
}

#[test]
fn inputs_of_every_kind() {
    let values = vec![1.0f32, 2.0, 3.5];
    assert_eq!(vector_sum(&values).unwrap(), 6.5);
    assert_eq!(vector_sum(&values[..2]).unwrap(), 3.0);

    let m = Mat::from_slice(&[4u8, 5, 6]).unwrap();
    assert_eq!(vector_sum(&m).unwrap(), 15.0);
    assert_eq!(vector_sum(&m.t().materialize().unwrap()).unwrap(), 15.0);

    let typed = TypedMat::<i16>::from_slice(1, 4, &[-1, -2, -3, -4]).unwrap();
    assert_eq!(vector_sum(&typed).unwrap(), -10.0);

    let square = Mat::zeros(&[3, 3], MatType::U8C1).unwrap();
    assert!(matches!(
        vector_sum(&square),
        Err(MatError::BadChannels(1))
    ));
}

#[test]
fn outputs_of_every_kind() {
    let mut m = Mat::default();
    fill_ramp(&mut m, 4).unwrap();
    assert_eq!(m.mat_type(), MatType::S32C1);
    assert_eq!(m.as_slice::<i32>().unwrap(), &[0, 1, 2, 3]);

    let mut typed = TypedMat::<f32>::default();
    fill_ramp(&mut typed, 3).unwrap();
    assert_eq!(typed[(2, 0)], 2.0);

    let dyn_dst: &mut dyn OutputArray = &mut m;
    fill_ramp(dyn_dst, 2).unwrap();
    assert_eq!(m.extents(), &[2, 1]);
}

#[test]
fn input_output_round_trip() {
    let mut m = Mat::from_slice(&[1i32, -2, 3]).unwrap();
    let ptr = m.data_ptr();
    negate_in_place(&mut m).unwrap();
    assert_eq!(m.as_slice::<i32>().unwrap(), &[-1, 2, -3]);
    assert_eq!(m.data_ptr(), ptr);

    let mut typed = TypedMat::<u8>::from_slice(1, 2, &[5, 0]).unwrap();
    negate_in_place(&mut typed).unwrap();
    assert_eq!(typed.row_slice(0), &[0, 0]);
}
