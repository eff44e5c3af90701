// @generated by objmap. Do not edit.

pub(crate) fn map_user_to_user_dto(source: &User) -> UserDto {
    let mut target: UserDto = <UserDto as ::core::default::Default>::default();
    target.id = source.id as i64;
    target.name = ::core::clone::Clone::clone(&source.name);
    target.score = source.score.map(|value| value as u32);
    Audit::mark(source, &mut target);
    target
}
pub(crate) fn map_user_onto_user_dto(source: &User, target: &mut UserDto) {
    target.id = source.id as i64;
    target.name = ::core::clone::Clone::clone(&source.name);
    target.score = source.score.map(|value| value as u32);
    Audit::mark(source, target);
}
const _: () = {
    impl ::objmap::MapTo<UserDto> for User {
        fn map_to(&self) -> UserDto {
            map_user_to_user_dto(self)
        }
    }
    impl ::objmap::MapOnto<UserDto> for User {
        fn map_onto(&self, target: &mut UserDto) {
            map_user_onto_user_dto(self, target)
        }
    }
};

pub(crate) fn map_user_dto_to_user(source: &UserDto) -> User {
    let target: User = <User>::new(
        source.id as i32,
        ::core::clone::Clone::clone(&source.name),
        source.score.map(|value| value as u16)
    );
    target
}
const _: () = {
    impl ::objmap::MapTo<User> for UserDto {
        fn map_to(&self) -> User {
            map_user_dto_to_user(self)
        }
    }
};

pub(crate) fn map_option_user_to_user_dto(source: &Option<User>) -> UserDto {
    let ::core::option::Option::Some(source_value) = source else {
        ::objmap::argument_null("source")
    };
    let mut target: UserDto = <UserDto as ::core::default::Default>::default();
    target.id = source_value.id as i64;
    target.name = ::core::clone::Clone::clone(&source_value.name);
    target.score = source_value.score.map(|value| value as u32);
    target
}
const _: () = {
    impl ::objmap::MapTo<UserDto> for Option<User> {
        fn map_to(&self) -> UserDto {
            map_option_user_to_user_dto(self)
        }
    }
};

pub(crate) fn map_vec_user_to_vec_user_dto(source: &Vec<User>) -> Vec<UserDto> {
    let target: Vec<UserDto> = ::objmap::builtin::collect(
        ::core::iter::IntoIterator::into_iter(&(*source)).map(|item| map_user_to_user_dto(&(*item)))
    );
    target
}
