#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub score: Option<u16>,
}

impl User {
    pub fn new(id: i32, name: String, score: Option<u16>) -> User {
        User { id, name, score }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub score: Option<u32>,
    pub audited: bool,
}

#[objmap::mapping_profile]
pub struct Audit;

impl Audit {
    #[objmap::post_mapping]
    fn mark(_source: &User, target: &mut UserDto) {
        target.audited = true;
    }
}

objmap::request!(
    User => UserDto,
    UserDto => User,
    User => &mut UserDto,
    Option<User> => UserDto,
    Vec<User> => Vec<UserDto>,
);
