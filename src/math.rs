use num_traits::Float;

/// A straight line `y = slope * x + intercept`, possibly undefined
///
/// Fields are `None` where the data cannot determine them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line<E> {
    pub slope: Option<E>,
    pub intercept: Option<E>,
    /// Coefficient of determination, only defined for two or more points
    pub r_squared: Option<E>,
}

/// Running sums for the closed-form least squares estimates
#[derive(Clone, Copy, Debug)]
struct Sums<E> {
    n: E,
    x: E,
    y: E,
    xx: E,
    yy: E,
    xy: E,
}

impl<E: Float> Sums<E> {
    fn new(points: &[(E, E)]) -> Self {
        points.iter().fold(
            Self {
                n: E::zero(),
                x: E::zero(),
                y: E::zero(),
                xx: E::zero(),
                yy: E::zero(),
                xy: E::zero(),
            },
            |sums, &(x, y)| Self {
                n: sums.n + E::one(),
                x: sums.x + x,
                y: sums.y + y,
                xx: sums.xx + x * x,
                yy: sums.yy + y * y,
                xy: sums.xy + x * y,
            },
        )
    }
}

/// `n·Σa² − (Σa)²`, or `None` when it vanishes to within rounding of its terms
fn spread<E: Float>(n: E, sum: E, sum_of_squares: E) -> Option<E> {
    let spread = n * sum_of_squares - sum * sum;
    let scale = n * sum_of_squares;
    if spread.abs() <= E::epsilon() * scale * n {
        None
    } else {
        Some(spread)
    }
}

/// Fit a line through `points` by ordinary least squares
///
/// The estimates come from the closed-form normal equations,
///
/// $$
///     m = \frac{n \sum xy - \sum x \sum y}{n \sum x^2 - \left(\sum x\right)^2}, \quad
///     b = \frac{\sum x^2 \sum y - \sum x \sum xy}{n \sum x^2 - \left(\sum x\right)^2}
/// $$
///
/// When every `x` is the same the line is undefined and all fields are `None`. When every `y`
/// is the same the line is defined but the coefficient of determination is not.
///
/// # Examples
///
/// ```
/// use drift_calibration::math::ordinary_least_squares;
///
/// let points: [(f64, f64); 3] = [(1., 3.), (2., 5.), (3., 7.)];
/// let line = ordinary_least_squares(&points);
///
/// assert!((line.slope.unwrap() - 2.).abs() < 1e-12);
/// assert!((line.intercept.unwrap() - 1.).abs() < 1e-12);
/// assert!((line.r_squared.unwrap() - 1.).abs() < 1e-12);
/// ```
pub fn ordinary_least_squares<E: Float>(points: &[(E, E)]) -> Line<E> {
    let sums = Sums::new(points);
    let Some(spread_x) = spread(sums.n, sums.x, sums.xx) else {
        return Line {
            slope: None,
            intercept: None,
            r_squared: None,
        };
    };

    let covariance = sums.n * sums.xy - sums.x * sums.y;
    let slope = covariance / spread_x;
    let intercept = (sums.xx * sums.y - sums.x * sums.xy) / spread_x;
    let r_squared = spread(sums.n, sums.y, sums.yy)
        .map(|spread_y| covariance * covariance / (spread_x * spread_y));

    Line {
        slope: Some(slope),
        intercept: Some(intercept),
        r_squared,
    }
}

/// A line through the origin and the single point `(x, y)`, expressed as the ratio `x / y`
///
/// One point cannot determine both slope and intercept, so the intercept is fixed at zero. The
/// slope is undefined when `y` is zero.
///
/// ```
/// use drift_calibration::math::single_point;
///
/// let line = single_point(500., 400.);
/// assert_eq!(line.slope, Some(1.25));
/// assert_eq!(line.intercept, Some(0.));
/// assert_eq!(line.r_squared, None);
/// ```
pub fn single_point<E: Float>(x: E, y: E) -> Line<E> {
    Line {
        slope: (y != E::zero()).then(|| x / y),
        intercept: Some(E::zero()),
        r_squared: None,
    }
}
